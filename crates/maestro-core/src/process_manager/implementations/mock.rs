use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::{CommandSpec, ProcId, ProcessManager, Spawned};

#[derive(Default)]
struct MockState {
    next_id: u64,
    spawned: Vec<CommandSpec>,
    terminated: Vec<ProcId>,
    released: Vec<ProcId>,
    running: HashMap<ProcId, oneshot::Sender<Option<i32>>>,
    fail_spawn: bool,
    next_stdout: Vec<Vec<u8>>,
}

/// Records calls and lets tests decide when a process exits.
///
/// Terminating a process drops its exit sender, which resolves the exit
/// future with `None` the way a real signal would.
#[derive(Clone, Default)]
pub struct MockProcessManager {
    state: Arc<Mutex<MockState>>,
}

impl MockProcessManager {
    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.state.lock().unwrap().spawned.clone()
    }

    pub fn terminated(&self) -> Vec<ProcId> {
        self.state.lock().unwrap().terminated.clone()
    }

    pub fn released(&self) -> Vec<ProcId> {
        self.state.lock().unwrap().released.clone()
    }

    pub fn fail_next_spawn(&self) {
        self.state.lock().unwrap().fail_spawn = true;
    }

    /// Stdout chunks the next spawned process prints.
    pub fn print_on_next_spawn(&self, chunks: Vec<Vec<u8>>) {
        self.state.lock().unwrap().next_stdout = chunks;
    }

    /// Make a running process exit with `code`.
    pub fn exit(&self, id: ProcId, code: i32) {
        let sender = self.state.lock().unwrap().running.remove(&id);
        if let Some(sender) = sender {
            let _ = sender.send(Some(code));
        }
    }
}

#[async_trait]
impl ProcessManager for MockProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> anyhow::Result<Spawned> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_spawn) {
            anyhow::bail!("No such file or directory (os error 2)");
        }

        let id = ProcId(state.next_id);
        state.next_id += 1;
        state.spawned.push(spec);
        let stdout = std::mem::take(&mut state.next_stdout);

        let (exit_tx, exit_rx) = oneshot::channel();
        state.running.insert(id, exit_tx);

        Ok(Spawned {
            id,
            pid: Some(1000 + u32::try_from(id.0).unwrap()),
            stdout: Box::pin(futures::stream::iter(stdout)),
            stderr: Box::pin(futures::stream::empty::<Vec<u8>>()),
            exit: async move { exit_rx.await.unwrap_or(None) }.boxed(),
        })
    }

    async fn terminate(&mut self, id: ProcId) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.terminated.push(id);
        state.running.remove(&id);
        Ok(())
    }

    fn release(&mut self, id: ProcId) {
        self.state.lock().unwrap().released.push(id);
    }
}
