//! HTTP boundary of the orchestrator.
//!
//! `POST /api/services` takes `{"action": "...", "name": "..."}` and answers
//! 200 with a message, 400 for a malformed body, 401 for a missing or
//! unknown bearer token and 500 with the orchestrator's message for anything
//! the orchestrator refuses. `GET /api/services` lists every service.

mod auth;
mod error;
mod routes;

use std::sync::Arc;

use axum::Router;
use maestro_core::Orchestrator;
use tower_http::trace::TraceLayer;

pub use auth::{Authenticator, TokenAuthenticator};
pub use error::{ApiError, ErrorBody};
pub use routes::{ActionRequest, ActionResponse, ServiceList, ServiceView};

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Orchestrator,
    pub authenticator: Arc<dyn Authenticator>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator, authenticator: impl Authenticator + 'static) -> Self {
        Self {
            orchestrator,
            authenticator: Arc::new(authenticator),
        }
    }
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("orchestrator", &self.orchestrator)
            .field("authenticator", &"[dyn Authenticator]")
            .finish()
    }
}

/// Creates the API router.
pub fn router(state: ApiState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
