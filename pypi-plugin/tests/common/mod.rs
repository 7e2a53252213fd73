//! Fakes shared by the plugin integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use pypi_core::{CommandExecutor, CommandOutput, CoreError, InvocationContext};
use pypi_plugin::{PypiPlugin, RawConfig};
use pypi_validation::HostResolver;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

/// Records every command instead of spawning it and replies with a canned result.
pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    output: String,
    fail_with: Option<i32>,
}

impl RecordingExecutor {
    pub fn succeeding(output: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: output.to_string(),
            fail_with: None,
        })
    }

    /// Fails as if the process exited with `code`.
    pub fn failing(output: &str, code: i32) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: output.to_string(),
            fail_with: Some(code),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(&self, _ctx: &InvocationContext, name: &str, args: &[String]) -> CommandOutput {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), args.to_vec()));

        match self.fail_with {
            None => CommandOutput::success(self.output.clone()),
            #[cfg(unix)]
            Some(code) => {
                CommandOutput::failed(self.output.clone(), CoreError::Exited(exit_status(code)))
            }
            #[cfg(not(unix))]
            Some(_) => CommandOutput::failed(
                self.output.clone(),
                CoreError::ToolMissing("twine".to_string()),
            ),
        }
    }
}

/// Resolves every hostname to the same addresses and counts lookups.
pub struct StaticResolver {
    addrs: Vec<IpAddr>,
    lookups: Mutex<usize>,
}

impl StaticResolver {
    pub fn new(addrs: Vec<IpAddr>) -> Arc<Self> {
        Arc::new(Self {
            addrs,
            lookups: Mutex::new(0),
        })
    }

    /// 151.101.0.223, a public address in the range PyPI is served from.
    pub fn public() -> Arc<Self> {
        Self::new(vec![IpAddr::V4(Ipv4Addr::new(151, 101, 0, 223))])
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, _host: &str) -> std::io::Result<Vec<IpAddr>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.addrs.clone())
    }
}

pub fn raw(value: Value) -> RawConfig {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn credentials() -> RawConfig {
    raw(json!({"username": "__token__", "password": "pypi-secret"}))
}

/// Plugin wired to fakes with an empty environment.
pub fn plugin_with(executor: Arc<RecordingExecutor>, resolver: Arc<StaticResolver>) -> PypiPlugin {
    PypiPlugin::new()
        .with_executor(executor)
        .with_resolver(resolver)
        .with_env(Arc::new(HashMap::<String, String>::new()))
}
