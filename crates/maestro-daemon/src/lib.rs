use std::{future::Future, net::SocketAddr};

use anyhow::Context as _;
use maestro_api::{router, ApiState, TokenAuthenticator};
use maestro_config::Config;
use maestro_core::{Orchestrator, OrchestratorEvent, ProcessManager};
use tokio::{net::TcpListener, sync::mpsc::Receiver};

/// Owns the orchestrator and serves its HTTP API.
#[derive(Debug)]
pub struct DaemonRunner {
    bind: SocketAddr,
    state: ApiState,
}

impl DaemonRunner {
    /// Build the orchestrator for `config`.
    ///
    /// Must be called from within a tokio runtime. The receiver yields child
    /// output and lifecycle events.
    #[must_use]
    pub fn new<P: ProcessManager + 'static>(
        config: Config,
        process_manager: P,
    ) -> (Self, Receiver<OrchestratorEvent>) {
        if config.tokens.is_empty() {
            tracing::warn!("No API tokens configured, every request will be rejected");
        }

        let (orchestrator, events) = Orchestrator::new(config.registry, process_manager);
        let authenticator = TokenAuthenticator::new(
            config
                .tokens
                .into_iter()
                .map(|grant| (grant.token, grant.actor)),
        );

        (
            Self {
                bind: config.server.bind,
                state: ApiState::new(orchestrator, authenticator),
            },
            events,
        )
    }

    /// Handle to the orchestrator behind the API.
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.state.orchestrator
    }

    /// Bind the listener and serve until `shutdown` resolves.
    ///
    /// Children still running at shutdown are left alone.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or the server fails.
    #[tracing::instrument(skip_all, fields(bind = %self.bind))]
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind)
            .await
            .with_context(|| format!("Cannot bind {}", self.bind))?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Listening on http://{local_addr}");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        tracing::info!("Daemon stopped");
        Ok(())
    }
}
