use crate::process_manager::types::{CommandSpec, ProcId, Spawned};

#[async_trait::async_trait]
pub trait ProcessManager: Send + Sync {
    /// Spawn a new process.
    async fn spawn(&mut self, spec: CommandSpec) -> anyhow::Result<Spawned>;
    /// Ask a process to terminate. Does not wait for it to exit.
    async fn terminate(&mut self, id: ProcId) -> anyhow::Result<()>;
    /// Drop bookkeeping for a process that has exited.
    fn release(&mut self, id: ProcId);
}
