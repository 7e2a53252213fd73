//! # Upload Configuration
//!
//! The host hands the plugin an untyped mapping. [`UploadConfig::resolve`] merges it
//! with credential fallbacks from the environment and fixed defaults:
//!
//! | key             | explicit value           | fallback          | default                            |
//! |-----------------|--------------------------|-------------------|------------------------------------|
//! | `username`      | non-empty string         | `PYPI_USERNAME`   | empty                              |
//! | `password`      | non-empty string         | `PYPI_PASSWORD`   | empty                              |
//! | `repository`    | non-empty string         |                   | `https://upload.pypi.org/legacy/`  |
//! | `dist_path`     | non-empty string         |                   | `dist/*`                           |
//! | `skip_existing` | boolean                  |                   | `false`                            |
//!
//! Values of the wrong type count as absent. Nothing is validated here.

use crate::error::{PluginError, PluginResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Raw plugin configuration as received from the host
pub type RawConfig = Map<String, Value>;

pub const DEFAULT_REPOSITORY: &str = "https://upload.pypi.org/legacy/";
pub const DEFAULT_DIST_PATH: &str = "dist/*";
pub const USERNAME_ENV: &str = "PYPI_USERNAME";
pub const PASSWORD_ENV: &str = "PYPI_PASSWORD";

/// Source of environment variables, injected so resolution stays deterministic in tests.
pub trait EnvLookup: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Fully resolved upload settings for one invocation
#[derive(Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub username: String,
    pub password: String,
    pub repository: String,
    pub dist_path: String,
    pub skip_existing: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            repository: DEFAULT_REPOSITORY.to_string(),
            dist_path: DEFAULT_DIST_PATH.to_string(),
            skip_existing: false,
        }
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "****" };
        f.debug_struct("UploadConfig")
            .field("username", &self.username)
            .field("password", &password)
            .field("repository", &self.repository)
            .field("dist_path", &self.dist_path)
            .field("skip_existing", &self.skip_existing)
            .finish()
    }
}

fn non_empty_str<'a>(raw: &'a RawConfig, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn with_env_fallback(raw: &RawConfig, key: &str, env: &dyn EnvLookup, var: &str) -> String {
    non_empty_str(raw, key)
        .map(str::to_string)
        .or_else(|| env.var(var).filter(|value| !value.is_empty()))
        .unwrap_or_default()
}

impl UploadConfig {
    /// Merge explicit values over environment fallbacks over defaults.
    pub fn resolve(raw: &RawConfig, env: &dyn EnvLookup) -> Self {
        let defaults = Self::default();
        Self {
            username: with_env_fallback(raw, "username", env, USERNAME_ENV),
            password: with_env_fallback(raw, "password", env, PASSWORD_ENV),
            repository: non_empty_str(raw, "repository")
                .map(str::to_string)
                .unwrap_or(defaults.repository),
            dist_path: non_empty_str(raw, "dist_path")
                .map(str::to_string)
                .unwrap_or(defaults.dist_path),
            skip_existing: raw
                .get("skip_existing")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.skip_existing),
        }
    }
}

/// Load a raw configuration mapping from a YAML or JSON file.
///
/// An empty file yields an empty mapping; anything other than a mapping is rejected.
pub fn load_raw_config(path: &Path) -> PluginResult<RawConfig> {
    let content = fs::read_to_string(path).map_err(|source| PluginError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value =
        serde_yaml_ng::from_str(&content).map_err(|source| PluginError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    match value {
        Value::Null => Ok(RawConfig::new()),
        Value::Object(map) => Ok(map),
        _ => Err(PluginError::ConfigNotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawConfig {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = UploadConfig::resolve(&RawConfig::new(), &env(&[]));
        assert_eq!(cfg, UploadConfig::default());
        assert_eq!(cfg.repository, "https://upload.pypi.org/legacy/");
        assert_eq!(cfg.dist_path, "dist/*");
        assert!(!cfg.skip_existing);
        assert!(cfg.username.is_empty());
    }

    #[test]
    fn test_custom_values() {
        let cfg = UploadConfig::resolve(
            &raw(json!({
                "username": "customuser",
                "password": "custompass",
                "repository": "https://test.pypi.org/legacy/",
                "dist_path": "build/*",
                "skip_existing": true
            })),
            &env(&[]),
        );
        assert_eq!(cfg.username, "customuser");
        assert_eq!(cfg.password, "custompass");
        assert_eq!(cfg.repository, "https://test.pypi.org/legacy/");
        assert_eq!(cfg.dist_path, "build/*");
        assert!(cfg.skip_existing);
    }

    #[test]
    fn test_env_fallback_and_precedence() {
        let vars = env(&[("PYPI_USERNAME", "envuser"), ("PYPI_PASSWORD", "envpass")]);

        let from_env = UploadConfig::resolve(&RawConfig::new(), &vars);
        assert_eq!(from_env.username, "envuser");
        assert_eq!(from_env.password, "envpass");

        let partial = UploadConfig::resolve(&raw(json!({"username": "configuser"})), &vars);
        assert_eq!(partial.username, "configuser");
        assert_eq!(partial.password, "envpass");

        let empty_explicit = UploadConfig::resolve(&raw(json!({"username": ""})), &vars);
        assert_eq!(empty_explicit.username, "envuser");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let cfg = UploadConfig::resolve(&RawConfig::new(), &env(&[("PYPI_USERNAME", "")]));
        assert!(cfg.username.is_empty());
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let cfg = UploadConfig::resolve(
            &raw(json!({
                "repository": 42,
                "dist_path": ["dist/*"],
                "skip_existing": "yes",
                "username": null
            })),
            &env(&[]),
        );
        assert_eq!(cfg, UploadConfig::default());
    }

    #[test]
    fn test_debug_masks_password() {
        let cfg = UploadConfig {
            username: "u".into(),
            password: "pypi-AgEIcHlwaS5vcmc".into(),
            ..UploadConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("pypi-AgEIcHlwaS5vcmc"));
        assert!(rendered.contains("****"));
    }
}
