//! # Validation Error Types

use pypi_core::CoreError;
use std::net::IpAddr;

/// Error types for validation failures
///
/// Display strings are user-facing: they end up verbatim in plugin responses.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("repository URL cannot be empty")]
    EmptyUrl,

    #[error("invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("only HTTP(S) URLs are allowed (got {scheme})")]
    UnsupportedScheme { scheme: String },

    #[error("only HTTPS URLs are allowed (got {scheme})")]
    HttpsRequired { scheme: String },

    #[error("failed to resolve hostname: {host}: {reason}")]
    ResolutionFailed { host: String, reason: String },

    #[error("URLs pointing to private networks are not allowed ({host} resolves to {address}, {range})")]
    PrivateNetwork {
        host: String,
        address: IpAddr,
        range: &'static str,
    },

    #[error("dist path cannot be empty")]
    EmptyPath,

    #[error("dist path too long (max {max} characters)")]
    PathTooLong { actual: usize, max: usize },

    #[error("dist path contains invalid characters")]
    InvalidCharacters { input: String },

    #[error("path traversal detected: cannot use '..' to escape working directory")]
    PathTraversal { path: String },

    #[error("absolute paths are not allowed")]
    AbsolutePath { path: String },

    #[error("{field} is required")]
    MissingCredential { field: &'static str },

    #[error(transparent)]
    Interrupted(#[from] CoreError),
}
