mod background;
mod commands;
mod main;

pub use commands::OrchestratorEvent;
pub use main::Orchestrator;
