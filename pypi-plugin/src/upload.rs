//! Upload orchestration: validate, then either describe the upload (dry run) or run
//! `twine` exactly once and translate its result.
//!
//! A failed upload is reported, never retried: the index may already have accepted
//! part of the release, and a blind second attempt can make that worse.

use crate::args::{build_twine_args, redacted_command_line, TWINE_COMMAND};
use crate::config::UploadConfig;
use crate::error::ConfigViolation;
use crate::types::ExecuteResponse;
use pypi_core::{CommandExecutor, InvocationContext};
use pypi_validation::{validate_dist_path, validate_repository_url, HostResolver, ValidationError};
use tracing::{debug, error, info, warn};

/// Strip a single leading `v` from a release version (`v1.2.3` -> `1.2.3`).
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Check everything an upload needs, stopping at the first problem.
///
/// Credentials and the dist path are checked before the repository URL so a broken
/// config never costs a DNS lookup.
pub async fn validate_upload_config(
    ctx: &InvocationContext,
    resolver: &dyn HostResolver,
    cfg: &UploadConfig,
) -> Result<(), ConfigViolation> {
    if cfg.username.is_empty() {
        return Err(ConfigViolation::Credential(
            ValidationError::MissingCredential { field: "username" },
        ));
    }
    if cfg.password.is_empty() {
        return Err(ConfigViolation::Credential(
            ValidationError::MissingCredential { field: "password" },
        ));
    }

    validate_dist_path(&cfg.dist_path).map_err(ConfigViolation::DistPath)?;

    validate_repository_url(ctx, resolver, &cfg.repository)
        .await
        .map_err(ConfigViolation::Repository)?;

    Ok(())
}

/// Upload the packages matched by `cfg.dist_path` to `cfg.repository`.
///
/// Every outcome, including invalid configuration and a failing `twine`, comes back as
/// an [`ExecuteResponse`].
pub async fn upload_package(
    ctx: &InvocationContext,
    executor: &dyn CommandExecutor,
    resolver: &dyn HostResolver,
    cfg: &UploadConfig,
    release_version: &str,
    dry_run: bool,
) -> ExecuteResponse {
    if let Err(violation) = validate_upload_config(ctx, resolver, cfg).await {
        warn!(field = violation.field(), error = %violation, "Upload configuration rejected");
        return ExecuteResponse::failure(format!(
            "configuration validation failed: {violation}"
        ));
    }

    let version = normalize_version(release_version);

    if dry_run {
        info!(
            repository = %cfg.repository,
            dist_path = %cfg.dist_path,
            skip_existing = cfg.skip_existing,
            version,
            "Dry run: skipping twine upload"
        );
        return ExecuteResponse::success(format!("Would upload package to {}", cfg.repository))
            .with_output("repository", cfg.repository.as_str())
            .with_output("dist_path", cfg.dist_path.as_str())
            .with_output("skip_existing", cfg.skip_existing)
            .with_output("version", version);
    }

    let args = build_twine_args(cfg);
    debug!(command = %redacted_command_line(TWINE_COMMAND, &args), "Running upload");
    info!(repository = %cfg.repository, version, "📦 Uploading package");

    let result = executor.run(ctx, TWINE_COMMAND, &args).await;
    let output = result.output_lossy().into_owned();

    if let Some(failure) = result.failure {
        error!(repository = %cfg.repository, error = %failure, "twine upload failed");
        return ExecuteResponse::failure(format!(
            "twine upload failed: {failure}\nOutput: {output}"
        ));
    }

    info!(repository = %cfg.repository, version, "✅ Package uploaded");
    ExecuteResponse::success(format!(
        "Successfully uploaded package to {}",
        cfg.repository
    ))
    .with_output("repository", cfg.repository.as_str())
    .with_output("dist_path", cfg.dist_path.as_str())
    .with_output("version", version)
    .with_output("output", output)
}
