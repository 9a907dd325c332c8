use std::{collections::HashMap, time::SystemTime};

use futures::StreamExt;
use maestro_types::{Actor, Registry};
use tokio::sync::mpsc;

use crate::{
    error::{Error, Result},
    orchestrator::commands::{OrchestratorCommand, OrchestratorEvent},
    process_manager::{BoxStream, CommandSpec, ExitFuture, ProcId, ProcessManager, Spawned},
    types::{Action, ServiceState, Status},
};

const EVENT_BUFFER: usize = 100;

#[derive(Debug, Clone)]
struct RunningProcess {
    id: ProcId,
    pid: Option<u32>,
    started_at: SystemTime,
}

/// Owns the runtime state of every service. Requests and exit notifications
/// arrive on the same queue, so every mutation happens here, one at a time.
pub(crate) struct OrchestratorBackground<P: ProcessManager> {
    process_manager: P,
    registry: Registry,
    storage: HashMap<String, Option<RunningProcess>>,

    commands_tx: mpsc::WeakSender<OrchestratorCommand>,
    commands_rx: mpsc::Receiver<OrchestratorCommand>,

    output_tx: mpsc::Sender<OrchestratorEvent>,
}

impl<P: ProcessManager> OrchestratorBackground<P> {
    pub fn new(
        registry: Registry,
        process_manager: P,
        commands_tx: mpsc::WeakSender<OrchestratorCommand>,
        commands_rx: mpsc::Receiver<OrchestratorCommand>,
    ) -> (Self, mpsc::Receiver<OrchestratorEvent>) {
        tracing::info!(
            "OrchestratorBackground initialized with {} services",
            registry.services.len()
        );

        let storage = registry.names().map(|name| (name.to_owned(), None)).collect();
        let (output_tx, output_rx) = mpsc::channel(EVENT_BUFFER);
        (
            Self {
                process_manager,
                registry,
                storage,
                commands_tx,
                commands_rx,
                output_tx,
            },
            output_rx,
        )
    }

    pub async fn run(&mut self) {
        tracing::info!("OrchestratorBackground started");

        while let Some(command) = self.commands_rx.recv().await {
            tracing::debug!("Received command: {command:?}");
            self.handle_command(command).await;
        }

        tracing::info!("OrchestratorBackground stopped");
    }

    async fn handle_command(&mut self, command: OrchestratorCommand) {
        match command {
            OrchestratorCommand::Execute {
                action,
                service,
                actor,
                reply,
            } => {
                let result = self.execute(&action, &service, &actor).await;
                if let Err(err) = &result {
                    tracing::warn!("Cannot {action:?} service {service:?} for {actor:?}: {err}");
                }
                if reply.send(result).is_err() {
                    tracing::debug!("Caller went away before {action:?} of {service:?} finished");
                }
            }
            OrchestratorCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            OrchestratorCommand::Exited {
                service,
                proc_id,
                code,
            } => self.exited(&service, proc_id, code).await,
        }
    }

    async fn execute(&mut self, action: &str, service: &str, actor: &Actor) -> Result<String> {
        if !self.registry.contains(service) {
            return Err(Error::UnknownService(service.to_owned()));
        }

        match action.parse::<Action>()? {
            Action::Start => {
                let pid = self.start(service, actor).await?;
                Ok(format!("{service} started by {actor} (pid {})", describe(pid)))
            }
            Action::Stop => {
                self.stop(service, actor).await?;
                Ok(format!("{service} stopped by {actor}"))
            }
            Action::Restart => {
                if self.is_running(service) {
                    self.stop(service, actor).await?;
                }
                let pid = self.start(service, actor).await?;
                Ok(format!("{service} restarted by {actor} (pid {})", describe(pid)))
            }
        }
    }

    fn is_running(&self, service: &str) -> bool {
        matches!(self.storage.get(service), Some(Some(_)))
    }

    async fn start(&mut self, service: &str, actor: &Actor) -> Result<Option<u32>> {
        let Some(definition) = self.registry.get(service) else {
            return Err(Error::UnknownService(service.to_owned()));
        };
        if self.is_running(service) {
            return Err(Error::AlreadyRunning(service.to_owned()));
        }

        let spec = CommandSpec {
            name: definition.name.clone(),
            cmd: definition.cmd.clone(),
            cwd: definition.cwd.clone(),
            env: definition
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        let Spawned {
            id,
            pid,
            stdout,
            stderr,
            exit,
        } = self
            .process_manager
            .spawn(spec)
            .await
            .map_err(|err| Error::Spawn {
                service: service.to_owned(),
                reason: format!("{err:#}"),
            })?;

        self.follow_output(service, stdout);
        self.follow_output(service, stderr);
        self.watch_exit(service, id, exit);

        self.storage.insert(
            service.to_owned(),
            Some(RunningProcess {
                id,
                pid,
                started_at: SystemTime::now(),
            }),
        );

        tracing::info!("Service {service:?} started by {actor:?} with pid {pid:?}");
        publish(
            &self.output_tx,
            OrchestratorEvent::Started {
                service: service.to_owned(),
                pid,
                actor: actor.name.clone(),
            },
        )
        .await;

        Ok(pid)
    }

    /// Signals the process and clears the handle right away. The exit
    /// notification that follows is ignored because the id no longer matches.
    async fn stop(&mut self, service: &str, actor: &Actor) -> Result<()> {
        let Some(Some(running)) = self.storage.get(service) else {
            return Err(Error::NotRunning(service.to_owned()));
        };
        let id = running.id;

        self.process_manager
            .terminate(id)
            .await
            .map_err(|err| Error::Signal {
                service: service.to_owned(),
                reason: format!("{err:#}"),
            })?;

        self.storage.insert(service.to_owned(), None);

        tracing::info!("Service {service:?} stopped by {actor:?}");
        publish(
            &self.output_tx,
            OrchestratorEvent::Stopped {
                service: service.to_owned(),
                actor: actor.name.clone(),
            },
        )
        .await;

        Ok(())
    }

    /// Clears the handle only if `proc_id` is still the current process of
    /// `service`. An exit that arrives after a stop or restart replaced the
    /// handle is dropped instead of marking the new process stopped. This is
    /// a deliberate departure from last-write-wins.
    async fn exited(&mut self, service: &str, proc_id: ProcId, code: Option<i32>) {
        self.process_manager.release(proc_id);

        let Some(slot) = self.storage.get_mut(service) else {
            return;
        };

        if slot.as_ref().is_some_and(|running| running.id == proc_id) {
            *slot = None;
            tracing::info!("Service {service:?} exited with code {code:?}");
            publish(
                &self.output_tx,
                OrchestratorEvent::Exited {
                    service: service.to_owned(),
                    code,
                },
            )
            .await;
        } else {
            tracing::debug!("Ignoring exit of stale process {proc_id:?} of {service:?}");
        }
    }

    fn status(&self) -> Vec<ServiceState> {
        self.registry
            .names()
            .map(|name| {
                let running = self.storage.get(name).cloned().flatten();
                ServiceState {
                    name: name.to_owned(),
                    pid: running.as_ref().and_then(|r| r.pid),
                    status: if running.is_some() {
                        Status::Running
                    } else {
                        Status::Stopped
                    },
                    started_at: running.map(|r| r.started_at),
                }
            })
            .collect()
    }

    fn follow_output(&self, service: &str, mut output: BoxStream<Vec<u8>>) {
        let output_tx = self.output_tx.clone();
        let service = service.to_owned();
        tokio::spawn(async move {
            // Keep reading after the receiver is gone so the child never
            // blocks on a full pipe.
            while let Some(chunk) = output.next().await {
                if output_tx.is_closed() {
                    continue;
                }
                let message = String::from_utf8_lossy(&chunk).into_owned();
                let _ = output_tx
                    .send(OrchestratorEvent::Log {
                        service: service.clone(),
                        message,
                    })
                    .await;
            }
        });
    }

    fn watch_exit(&self, service: &str, proc_id: ProcId, exit: ExitFuture) {
        let commands_tx = self.commands_tx.upgrade();
        let service = service.to_owned();
        tokio::spawn(async move {
            let code = exit.await;
            let Some(commands_tx) = commands_tx else {
                return;
            };
            if let Err(err) = commands_tx
                .send(OrchestratorCommand::Exited {
                    service,
                    proc_id,
                    code,
                })
                .await
            {
                tracing::error!("Failed to send exit notification: {err}");
            }
        });
    }
}

/// Lifecycle events wait for a free slot like output chunks do, so a chatty
/// service cannot crowd them out. A closed receiver is ignored.
async fn publish(output_tx: &mpsc::Sender<OrchestratorEvent>, event: OrchestratorEvent) {
    if let Err(err) = output_tx.send(event).await {
        tracing::trace!("Nobody listens for events, dropping {:?}", err.0);
    }
}

fn describe(pid: Option<u32>) -> String {
    pid.map_or_else(|| "unknown".to_owned(), |pid| pid.to_string())
}
