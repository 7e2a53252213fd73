use crate::config::{
    EnvLookup, ProcessEnv, RawConfig, UploadConfig, DEFAULT_DIST_PATH, DEFAULT_REPOSITORY,
    PASSWORD_ENV, USERNAME_ENV,
};
use crate::types::{
    ExecuteRequest, ExecuteResponse, Hook, PluginInfo, ValidateResponse, ValidationBuilder,
};
use crate::upload::upload_package;
use pypi_core::{CommandExecutor, InvocationContext, SystemExecutor};
use pypi_validation::{
    validate_dist_path, validate_repository_url, HostResolver, SystemResolver,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

pub const PLUGIN_NAME: &str = "pypi";

/// Publishes Python packages to PyPI on `post-publish`.
///
/// Process execution, hostname resolution and environment access are injected so the
/// plugin can run against fakes.
#[derive(Clone)]
pub struct PypiPlugin {
    executor: Arc<dyn CommandExecutor>,
    resolver: Arc<dyn HostResolver>,
    env: Arc<dyn EnvLookup>,
}

impl Default for PypiPlugin {
    fn default() -> Self {
        Self {
            executor: Arc::new(SystemExecutor),
            resolver: Arc::new(SystemResolver),
            env: Arc::new(ProcessEnv),
        }
    }
}

impl fmt::Debug for PypiPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PypiPlugin").finish_non_exhaustive()
    }
}

impl PypiPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvLookup>) -> Self {
        self.env = env;
        self
    }

    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Publish packages to PyPI (Python Package Index)".to_string(),
            author: "PyPI Publish Plugin Contributors".to_string(),
            hooks: vec![Hook::PostPublish],
            config_schema: json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": format!("PyPI username (or use {USERNAME_ENV} env)")},
                    "password": {"type": "string", "description": format!("PyPI password or API token (or use {PASSWORD_ENV} env)")},
                    "repository": {"type": "string", "description": "Repository URL", "default": DEFAULT_REPOSITORY},
                    "dist_path": {"type": "string", "description": "Path to distribution files", "default": DEFAULT_DIST_PATH},
                    "skip_existing": {"type": "boolean", "description": "Skip upload if version exists", "default": false}
                },
                "required": []
            }),
        }
    }

    pub fn parse_config(&self, raw: &RawConfig) -> UploadConfig {
        UploadConfig::resolve(raw, self.env.as_ref())
    }

    /// Run the plugin for one hook. Hooks other than `post-publish` are acknowledged
    /// and ignored.
    pub async fn execute(
        &self,
        ctx: &InvocationContext,
        req: &ExecuteRequest,
    ) -> ExecuteResponse {
        let span = info_span!("execute", hook = %req.hook, dry_run = req.dry_run);

        async {
            match req.hook {
                Hook::PostPublish => {
                    let cfg = self.parse_config(&req.config);
                    upload_package(
                        ctx,
                        self.executor.as_ref(),
                        self.resolver.as_ref(),
                        &cfg,
                        &req.context.version,
                        req.dry_run,
                    )
                    .await
                }
                other => {
                    debug!(hook = %other, "Hook not handled");
                    ExecuteResponse::success(format!("Hook {other} not handled"))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Report every configuration problem at once, grouped by field.
    pub async fn validate(&self, ctx: &InvocationContext, raw: &RawConfig) -> ValidateResponse {
        let cfg = self.parse_config(raw);
        let mut vb = ValidationBuilder::new();

        if cfg.username.is_empty() {
            vb.add_error(
                "username",
                format!("username is required (set via config or {USERNAME_ENV} env var)"),
            );
        }
        if cfg.password.is_empty() {
            vb.add_error(
                "password",
                format!("password is required (set via config or {PASSWORD_ENV} env var)"),
            );
        }

        if !cfg.repository.is_empty() {
            let checked =
                validate_repository_url(ctx, self.resolver.as_ref(), &cfg.repository).await;
            if let Err(e) = checked {
                vb.add_error("repository", e.to_string());
            }
        }

        if !cfg.dist_path.is_empty() {
            if let Err(e) = validate_dist_path(&cfg.dist_path) {
                vb.add_error("dist_path", e.to_string());
            }
        }

        let response = vb.build();
        if response.valid {
            debug!("Configuration validated");
        } else {
            let fields: Vec<&str> = response.errors.keys().map(String::as_str).collect();
            warn!(fields = ?fields, "Configuration has problems");
        }
        response
    }
}
