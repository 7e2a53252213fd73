//! # Upload Input Validation
//!
//! Security checks for the two attacker-influenceable inputs of a package upload: the
//! repository URL the credentials are sent to, and the dist path handed to the upload
//! tool on its command line.
//!
//! ## Security Features
//!
//! - SSRF prevention: HTTPS-only remote endpoints, resolution of every hostname and
//!   rejection of private, loopback, link-local and cloud metadata addresses
//! - DNS rebinding defence: one disallowed address rejects the whole hostname
//! - Argument injection prevention through a strict character allow-list
//! - Path traversal and absolute path rejection
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pypi_core::InvocationContext;
//! use pypi_validation::{validate_dist_path, validate_repository_url, SystemResolver};
//!
//! # async fn run() -> Result<(), pypi_validation::ValidationError> {
//! let ctx = InvocationContext::new();
//! validate_repository_url(&ctx, &SystemResolver, "https://upload.pypi.org/legacy/").await?;
//! validate_dist_path("dist/*")?;
//! # Ok(())
//! # }
//! ```

pub mod endpoint;
pub mod error;
pub mod network;
pub mod paths;
pub mod result;

pub use self::{
    endpoint::{
        is_localhost_host, validate_repository_url, HostResolver, SystemResolver,
        LOCALHOST_HOSTS,
    },
    error::ValidationError,
    network::{classify_ip, is_disallowed_ip},
    paths::{clean_path, validate_dist_path, MAX_DIST_PATH_LENGTH},
    result::ValidationResult,
};
