mod error;
mod orchestrator;
mod process_manager;
mod types;

pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, OrchestratorEvent};
pub use process_manager::{BoxStream, CommandSpec, ExitFuture, ProcId, ProcessManager, Spawned};
#[cfg(unix)]
pub use process_manager::UnixProcessManager;
pub use types::{Action, ServiceState, Status};
