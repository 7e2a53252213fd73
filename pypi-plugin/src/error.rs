use pypi_validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the plugin from even producing a response
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("config file {} must contain a mapping of settings", path.display())]
    ConfigNotAMapping { path: PathBuf },
}

pub type PluginResult<T> = Result<T, PluginError>;

/// The first configuration problem found before an upload, tagged with its field
#[derive(Error, Debug)]
pub enum ConfigViolation {
    #[error("{0}")]
    Credential(ValidationError),

    #[error("invalid dist path: {0}")]
    DistPath(ValidationError),

    #[error("invalid repository URL: {0}")]
    Repository(ValidationError),
}

impl ConfigViolation {
    /// Config key the violation belongs to
    pub fn field(&self) -> &'static str {
        match self {
            ConfigViolation::Credential(ValidationError::MissingCredential { field }) => *field,
            ConfigViolation::Credential(_) => "credentials",
            ConfigViolation::DistPath(_) => "dist_path",
            ConfigViolation::Repository(_) => "repository",
        }
    }
}
