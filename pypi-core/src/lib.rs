pub mod command;
pub mod context;
pub mod error;

pub use command::{is_tool_installed, CommandExecutor, CommandOutput, SystemExecutor};
pub use context::InvocationContext;
pub use error::{CoreError, Result};
pub use tokio_util::sync::CancellationToken;
