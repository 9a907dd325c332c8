use maestro_types::Actor;
use tokio::sync::oneshot;

use crate::{error::Result, process_manager::ProcId, ServiceState};

#[derive(Debug)]
pub(crate) enum OrchestratorCommand {
    Execute {
        action: String,
        service: String,
        actor: Actor,
        reply: oneshot::Sender<Result<String>>,
    },
    Status {
        reply: oneshot::Sender<Vec<ServiceState>>,
    },
    Exited {
        service: String,
        proc_id: ProcId,
        code: Option<i32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    Started {
        service: String,
        pid: Option<u32>,
        actor: String,
    },
    Stopped {
        service: String,
        actor: String,
    },
    Exited {
        service: String,
        code: Option<i32>,
    },
    Log {
        service: String,
        message: String,
    },
}
