//! Command-line entry point for the PyPI publish plugin.
//!
//! Prints the plugin's JSON response on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pypi_core::InvocationContext;
use pypi_plugin::{
    load_raw_config, ExecuteRequest, Hook, PypiPlugin, RawConfig, ReleaseContext,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pypi-plugin")]
#[command(about = "Publish Python packages to PyPI after a release")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Invocation {
    /// YAML or JSON file with plugin settings (credentials may come from PYPI_USERNAME/PYPI_PASSWORD)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort resolution and upload after this many seconds (0 disables the limit)
    #[arg(long, env = "PYPI_PLUGIN_TIMEOUT_SECS", default_value = "600")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print plugin metadata and config schema
    Info,

    /// Check a configuration and report every problem
    Validate {
        #[command(flatten)]
        invocation: Invocation,
    },

    /// Run the plugin for a release lifecycle hook
    Execute {
        #[command(flatten)]
        invocation: Invocation,

        /// Lifecycle hook to run
        #[arg(long, default_value = "post-publish")]
        hook: Hook,

        /// Version being released (a leading "v" is dropped)
        #[arg(long)]
        release_version: String,

        /// Git tag of the release
        #[arg(long)]
        tag_name: Option<String>,

        /// Report what would be uploaded without running twine
        #[arg(long)]
        dry_run: bool,
    },
}

impl Invocation {
    fn load_config(&self) -> Result<RawConfig> {
        match &self.config {
            Some(path) => load_raw_config(path)
                .with_context(|| format!("Could not load plugin config from {}", path.display())),
            None => Ok(RawConfig::new()),
        }
    }

    /// Context that is cancelled on Ctrl-C and bounded by the timeout.
    fn context(&self) -> InvocationContext {
        let mut ctx = InvocationContext::new();
        if self.timeout_secs > 0 {
            ctx = ctx.with_timeout(Duration::from_secs(self.timeout_secs));
        }

        let token = ctx.cancel_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling upload");
                token.cancel();
            }
        });

        ctx
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Could not serialize response")?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _guard = pypi_logging::init_subscriber();
    let cli = Cli::parse();
    let plugin = PypiPlugin::new();

    let ok = match cli.command {
        Commands::Info => {
            print_json(&plugin.info())?;
            true
        }
        Commands::Validate { invocation } => {
            let raw = invocation.load_config()?;
            let response = plugin.validate(&invocation.context(), &raw).await;
            print_json(&response)?;
            response.valid
        }
        Commands::Execute {
            invocation,
            hook,
            release_version,
            tag_name,
            dry_run,
        } => {
            let request = ExecuteRequest {
                hook,
                config: invocation.load_config()?,
                context: ReleaseContext {
                    version: release_version,
                    tag_name,
                    ..ReleaseContext::default()
                },
                dry_run,
            };
            info!(hook = %request.hook, dry_run, "Executing plugin hook");
            let response = plugin.execute(&invocation.context(), &request).await;
            print_json(&response)?;
            response.success
        }
    };

    // `_guard` drops on return and flushes file logs.
    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
