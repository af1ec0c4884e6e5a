//! Health Check API Handler

use anklet_client::Connector;
use axum::{Json, extract::State, response::IntoResponse};

use crate::api::AppState;

/// GET /health
/// Reports the trigger target and how many sessions are in flight
pub async fn health_check<C: Connector>(State(state): State<AppState<C>>) -> impl IntoResponse {
    let active = state.max_sessions - state.sessions.available_permits();

    Json(serde_json::json!({
        "status": "ok",
        "service": "anklet-server",
        "workload": state.request.workload,
        "agent": state.request.agent,
        "active_sessions": active,
    }))
}
