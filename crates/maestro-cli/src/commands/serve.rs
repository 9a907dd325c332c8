use std::net::SocketAddr;

use anyhow::Result;
use maestro_core::{OrchestratorEvent, UnixProcessManager};
use maestro_daemon::DaemonRunner;
use tokio::signal;

use crate::logger::Logger;

pub async fn serve(file: Option<String>, bind: Option<SocketAddr>) -> Result<()> {
    let (path, mut config) = super::load(file)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    tracing::info!(
        "Loaded {} services from {}",
        config.registry.services.len(),
        path.display()
    );

    let (daemon, mut events) = DaemonRunner::new(config, UnixProcessManager::new());

    tokio::spawn(async move {
        let mut logger = Logger::stdout();
        while let Some(event) = events.recv().await {
            match event {
                OrchestratorEvent::Log { service, message } => logger.log(&service, &message),
                OrchestratorEvent::Started {
                    service,
                    pid,
                    actor,
                } => logger.system(&format!(
                    "{service} started by {actor} (pid {})",
                    pid.map_or_else(|| "unknown".to_owned(), |pid| pid.to_string())
                )),
                OrchestratorEvent::Stopped { service, actor } => {
                    logger.system(&format!("{service} stopped by {actor}"));
                }
                OrchestratorEvent::Exited { service, code } => match code {
                    Some(code) => logger.system(&format!("{service} exited with code {code}")),
                    None => logger.system(&format!("{service} was terminated by a signal")),
                },
            }
        }
    });

    daemon
        .serve(async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("Cannot listen for Ctrl+C: {err}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Ctrl+C: shutting down, running services are left alone");
        })
        .await
}
