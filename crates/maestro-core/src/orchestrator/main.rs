use maestro_types::{Actor, Registry};
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::{Error, Result},
    orchestrator::{
        background::OrchestratorBackground,
        commands::{OrchestratorCommand, OrchestratorEvent},
    },
    process_manager::ProcessManager,
    types::{Action, ServiceState},
};

const COMMAND_BUFFER: usize = 100;

/// Handle to the orchestrator task.
///
/// All state lives in a single background task; this handle only sends it
/// commands, so it is cheap to clone and share between request handlers.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    commands_tx: mpsc::Sender<OrchestratorCommand>,
}

impl Orchestrator {
    /// Spawn the orchestrator task for a fixed registry.
    ///
    /// The returned receiver yields lifecycle events and child output. It may
    /// be dropped if nobody is interested in them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<P: ProcessManager + 'static>(
        registry: Registry,
        process_manager: P,
    ) -> (Self, mpsc::Receiver<OrchestratorEvent>) {
        let (commands_tx, commands_rx) = mpsc::channel::<OrchestratorCommand>(COMMAND_BUFFER);
        let (mut inner, output_rx) = OrchestratorBackground::new(
            registry,
            process_manager,
            commands_tx.downgrade(),
            commands_rx,
        );

        tokio::spawn(async move {
            inner.run().await;
        });

        (Self { commands_tx }, output_rx)
    }

    /// Run `action` (`start`, `stop` or `restart`) against `service` on
    /// behalf of `actor`, returning a confirmation message.
    ///
    /// The service name is checked before the action, so an unregistered
    /// service is reported as such whatever the action.
    ///
    /// # Errors
    /// Returns `Error::UnknownService`, then `Error::UnsupportedAction` for an
    /// unknown action, and any error of [`Orchestrator::dispatch`].
    pub async fn execute(&self, action: &str, service: &str, actor: &Actor) -> Result<String> {
        self.request(action.to_owned(), service, actor).await
    }

    /// Typed variant of [`Orchestrator::execute`].
    ///
    /// # Errors
    /// Returns `Error::UnknownService`, `Error::AlreadyRunning`,
    /// `Error::NotRunning`, a spawn or signal failure, or
    /// `Error::Unavailable` if the background task is gone.
    pub async fn dispatch(&self, action: Action, service: &str, actor: &Actor) -> Result<String> {
        self.request(action.as_str().to_owned(), service, actor).await
    }

    async fn request(&self, action: String, service: &str, actor: &Actor) -> Result<String> {
        tracing::trace!("Received {action:?} for service {service:?} from {actor:?}");

        let (reply, response) = oneshot::channel();
        self.commands_tx
            .send(OrchestratorCommand::Execute {
                action,
                service: service.to_owned(),
                actor: actor.clone(),
                reply,
            })
            .await
            .map_err(|err| Error::Unavailable(err.to_string()))?;

        response
            .await
            .map_err(|err| Error::Unavailable(err.to_string()))?
    }

    /// Snapshot of every registered service, ordered by name.
    ///
    /// # Errors
    /// Returns `Error::Unavailable` if the background task is gone.
    pub async fn status(&self) -> Result<Vec<ServiceState>> {
        let (reply, response) = oneshot::channel();
        self.commands_tx
            .send(OrchestratorCommand::Status { reply })
            .await
            .map_err(|err| Error::Unavailable(err.to_string()))?;

        response
            .await
            .map_err(|err| Error::Unavailable(err.to_string()))
    }
}
