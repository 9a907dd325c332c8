use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, ApiState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceView {
    pub name: String,
    pub status: String,
    pub pid: Option<u32>,
    pub uptime_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceList {
    pub services: Vec<ServiceView>,
}

/// Start, stop or restart a service.
///
/// Authentication is checked before the body is looked at.
pub(crate) async fn execute_action(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let actor = state
        .authenticator
        .authenticate(&headers)
        .ok_or(ApiError::Unauthorized)?;

    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if request.action.trim().is_empty() {
        return Err(ApiError::BadRequest("`action` must not be empty".to_owned()));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("`name` must not be empty".to_owned()));
    }

    tracing::info!(
        "{} ({}) requested {} of {:?}",
        actor.name,
        actor.id,
        request.action,
        request.name
    );

    let message = state
        .orchestrator
        .execute(&request.action, &request.name, &actor)
        .await?;

    Ok(Json(ActionResponse { message }))
}

pub(crate) async fn list_services(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<ServiceList>, ApiError> {
    state
        .authenticator
        .authenticate(&headers)
        .ok_or(ApiError::Unauthorized)?;

    let services = state
        .orchestrator
        .status()
        .await?
        .into_iter()
        .map(|service| ServiceView {
            status: service.status.as_str().to_owned(),
            uptime_secs: service
                .started_at
                .and_then(|started_at| started_at.elapsed().ok())
                .map(|uptime| uptime.as_secs()),
            pid: service.pid,
            name: service.name,
        })
        .collect();

    Ok(Json(ServiceList { services }))
}

pub fn routes() -> Router<ApiState> {
    Router::new().route("/api/services", get(list_services).post(execute_action))
}
