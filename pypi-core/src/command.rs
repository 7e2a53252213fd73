use crate::context::InvocationContext;
use crate::error::CoreError;
use async_trait::async_trait;
use std::borrow::Cow;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};
use which::which;

/// Raw result of one external command: everything it printed plus the failure, if any.
#[derive(Debug)]
pub struct CommandOutput {
    pub output: Vec<u8>,
    pub failure: Option<CoreError>,
}

impl CommandOutput {
    pub fn success(output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: output.into(),
            failure: None,
        }
    }

    pub fn failed(output: impl Into<Vec<u8>>, failure: CoreError) -> Self {
        Self {
            output: output.into(),
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn output_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Runs external commands.
///
/// Production code binds [`SystemExecutor`]; tests bind a recorder that never spawns
/// a process.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, ctx: &InvocationContext, name: &str, args: &[String]) -> CommandOutput;
}

/// Executes real processes, capturing stdout and stderr as one interleaved stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(&self, ctx: &InvocationContext, name: &str, args: &[String]) -> CommandOutput {
        if !is_tool_installed(name) {
            warn!(tool = %name, "Required tool not found in PATH");
            return CommandOutput::failed(Vec::new(), CoreError::ToolMissing(name.to_string()));
        }

        debug!(tool = %name, arg_count = args.len(), "Spawning command");

        let mut child = match Command::new(name)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                return CommandOutput::failed(
                    Vec::new(),
                    CoreError::Spawn {
                        command: name.to_string(),
                        source,
                    },
                )
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // An interrupted run drops the guarded future and the child with it.
        let what = format!("command '{name}'");
        let finished = ctx
            .guard(&what, async move {
                let combined = read_interleaved(stdout, stderr).await?;
                let status = child.wait().await?;
                Ok::<_, io::Error>((status, combined))
            })
            .await;

        let (status, combined) = match finished {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => return CommandOutput::failed(Vec::new(), CoreError::Io(e)),
            Err(interrupted) => return CommandOutput::failed(Vec::new(), interrupted),
        };

        if status.success() {
            debug!(tool = %name, bytes = combined.len(), "Command finished");
            CommandOutput::success(combined)
        } else {
            debug!(tool = %name, status = ?status.code(), "Command exited unsuccessfully");
            CommandOutput::failed(combined, CoreError::Exited(status))
        }
    }
}

async fn read_chunk<R>(stream: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(stream) => stream.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Drain both pipes into one buffer in the order the chunks arrive.
async fn read_interleaved(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
) -> io::Result<Vec<u8>> {
    let mut combined = Vec::new();
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match read? {
                0 => stdout = None,
                n => combined.extend_from_slice(&out_buf[..n]),
            },
            read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match read? {
                0 => stderr = None,
                n => combined.extend_from_slice(&err_buf[..n]),
            },
        }
    }

    Ok(combined)
}

/// Checks if a command-line tool is available in the system's PATH.
pub fn is_tool_installed(tool_name: &str) -> bool {
    which(tool_name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_command_output_constructors() {
        let ok = CommandOutput::success("uploaded");
        assert!(ok.is_success());
        assert_eq!(ok.output_lossy(), "uploaded");

        let failed = CommandOutput::failed(
            b"HTTPError: 400".to_vec(),
            CoreError::ToolMissing("twine".into()),
        );
        assert!(!failed.is_success());
        assert_eq!(failed.output_lossy(), "HTTPError: 400");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported_not_spawned() {
        let ctx = InvocationContext::new();
        let result = SystemExecutor
            .run(&ctx, "definitely-not-a-real-tool-4f2a9c", &[])
            .await;

        assert!(matches!(result.failure, Some(CoreError::ToolMissing(_))));
        assert!(result.output.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_and_exit_status() {
        let ctx = InvocationContext::new();

        let ok = SystemExecutor
            .run(&ctx, "sh", &["-c".to_string(), "echo hello".to_string()])
            .await;
        assert!(ok.is_success());
        assert_eq!(ok.output_lossy().trim(), "hello");

        let failed = SystemExecutor
            .run(
                &ctx,
                "sh",
                &["-c".to_string(), "echo broken >&2; exit 3".to_string()],
            )
            .await;
        assert!(matches!(failed.failure, Some(CoreError::Exited(_))));
        assert!(failed.output_lossy().contains("broken"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_and_stderr_keep_arrival_order() {
        let ctx = InvocationContext::new();
        let script = "echo progress; sleep 0.2; echo 'HTTPError: 400' >&2; sleep 0.2; echo done";

        let result = SystemExecutor
            .run(&ctx, "sh", &["-c".to_string(), script.to_string()])
            .await;

        assert!(result.is_success());
        assert_eq!(result.output_lossy(), "progress\nHTTPError: 400\ndone\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("uploaded");
        let script = format!("sleep 2; touch '{}'", marker.display());
        let ctx = InvocationContext::new().with_timeout(Duration::from_millis(200));

        let result = SystemExecutor
            .run(&ctx, "sh", &["-c".to_string(), script])
            .await;

        assert!(matches!(result.failure, Some(CoreError::Timeout { .. })));
        assert!(result.output.is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "child must not outlive the timeout");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("uploaded");
        let script = format!("sleep 2; touch '{}'", marker.display());

        let token = CancellationToken::new();
        let ctx = InvocationContext::new().with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });

        let result = SystemExecutor
            .run(&ctx, "sh", &["-c".to_string(), script])
            .await;
        canceller.await.unwrap();

        assert!(matches!(result.failure, Some(CoreError::Cancelled(_))));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "child must not outlive cancellation");
    }
}
