//! # Input Validation: Repository URL (SSRF protection)
//!
//! Uploads carry credentials, so the destination URL has to be checked before anything
//! is sent to it. Plain HTTP is tolerated only for localhost test servers, and every
//! address a hostname resolves to must be public.

use crate::error::ValidationError;
use crate::network::classify_ip;
use crate::result::ValidationResult;
use async_trait::async_trait;
use pypi_core::InvocationContext;
use std::net::IpAddr;
use tracing::{debug, warn};
use url::{Host, Url};

/// Hosts that may use plain HTTP and skip resolution. Compared textually.
pub const LOCALHOST_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// Turns a hostname into the addresses it currently points at.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo` via tokio).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// True for the hostnames that are allowed to use plain HTTP.
pub fn is_localhost_host(host: &str) -> bool {
    LOCALHOST_HOSTS.contains(&host)
}

/// Hostname without IPv6 brackets, as written after URL normalisation.
fn host_text(host: &Host<&str>) -> String {
    match host {
        Host::Domain(domain) => (*domain).to_string(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    }
}

/// Validate that a repository URL is safe to upload to.
///
/// Checks run in a fixed order: emptiness, syntax, scheme, the HTTPS requirement for
/// non-localhost hosts, then resolution of the host and classification of every
/// address it resolves to. A single private address rejects the whole URL.
///
/// Resolution runs under `ctx`, so cancellation or an expired deadline produces
/// [`ValidationError::Interrupted`].
pub async fn validate_repository_url(
    ctx: &InvocationContext,
    resolver: &dyn HostResolver,
    raw_url: &str,
) -> ValidationResult<Url> {
    if raw_url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let parsed = Url::parse(raw_url).map_err(|e| ValidationError::InvalidUrl {
        reason: e.to_string(),
    })?;

    let host = parsed.host();
    let host_name = host.as_ref().map(host_text).unwrap_or_default();
    let is_localhost = is_localhost_host(&host_name);

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ValidationError::UnsupportedScheme {
            scheme: scheme.to_string(),
        });
    }

    if scheme == "http" && !is_localhost {
        return Err(ValidationError::HttpsRequired {
            scheme: scheme.to_string(),
        });
    }

    // Localhost is never resolved.
    if is_localhost {
        debug!(host = %host_name, "Accepting localhost repository without resolution");
        return Ok(parsed);
    }

    let addresses = match host {
        Some(Host::Ipv4(addr)) => vec![IpAddr::V4(addr)],
        Some(Host::Ipv6(addr)) => vec![IpAddr::V6(addr)],
        Some(Host::Domain(domain)) => resolve_host(ctx, resolver, domain).await?,
        None => {
            return Err(ValidationError::InvalidUrl {
                reason: "missing host".to_string(),
            })
        }
    };

    for address in &addresses {
        if let Some(range) = classify_ip(*address) {
            warn!(host = %host_name, %address, range, "Repository URL points at a disallowed address");
            return Err(ValidationError::PrivateNetwork {
                host: host_name,
                address: *address,
                range,
            });
        }
    }

    debug!(host = %host_name, addresses = addresses.len(), "Repository URL passed SSRF checks");
    Ok(parsed)
}

async fn resolve_host(
    ctx: &InvocationContext,
    resolver: &dyn HostResolver,
    host: &str,
) -> ValidationResult<Vec<IpAddr>> {
    let resolved = ctx
        .guard("hostname resolution", resolver.resolve(host))
        .await?;

    match resolved {
        Ok(addresses) if addresses.is_empty() => Err(ValidationError::ResolutionFailed {
            host: host.to_string(),
            reason: "no addresses returned".to_string(),
        }),
        Ok(addresses) => Ok(addresses),
        Err(e) => Err(ValidationError::ResolutionFailed {
            host: host.to_string(),
            reason: e.to_string(),
        }),
    }
}
