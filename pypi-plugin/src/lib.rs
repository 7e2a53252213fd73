//! # PyPI Publish Plugin
//!
//! Release plugin that uploads built Python distributions with `twine` once a release
//! has been published. Before anything runs, the repository URL is checked for SSRF
//! targets and the dist path for traversal and injection payloads.
//!
//! ## Entry points
//!
//! - [`PypiPlugin::info`]: metadata and config schema
//! - [`PypiPlugin::validate`]: every configuration problem, grouped by field
//! - [`PypiPlugin::execute`]: run a lifecycle hook (only `post-publish` does work)

pub mod args;
pub mod config;
pub mod error;
pub mod plugin;
pub mod types;
pub mod upload;

pub use args::{build_twine_args, TWINE_COMMAND};
pub use config::{load_raw_config, EnvLookup, ProcessEnv, RawConfig, UploadConfig};
pub use error::{ConfigViolation, PluginError, PluginResult};
pub use plugin::{PypiPlugin, PLUGIN_NAME};
pub use types::{
    ExecuteRequest, ExecuteResponse, Hook, PluginInfo, ReleaseContext, ValidateResponse,
    ValidationBuilder,
};
pub use upload::{normalize_version, upload_package, validate_upload_config};
