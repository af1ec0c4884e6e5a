//! API Module
//!
//! HTTP layer of the trigger server.

pub mod health;
pub mod trigger;

use std::sync::Arc;

use anklet_client::Connector;
use anklet_client::workflow::TriggerRequest;
use axum::{Router, routing::get};
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

/// State shared by all handlers
pub struct AppState<C: Connector> {
    /// Opens one orchestrator session per trigger
    pub connector: Arc<C>,
    /// Workload, agent and timeout used by every trigger
    pub request: TriggerRequest,
    /// Bounds how many sessions occupy the blocking pool at once
    pub sessions: Arc<Semaphore>,
    pub max_sessions: usize,
}

impl<C: Connector> AppState<C> {
    pub fn new(connector: C, request: TriggerRequest, max_sessions: usize) -> Self {
        Self {
            connector: Arc::new(connector),
            request,
            sessions: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
        }
    }
}

impl<C: Connector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            request: self.request.clone(),
            sessions: Arc::clone(&self.sessions),
            max_sessions: self.max_sessions,
        }
    }
}

/// Create the main router with all endpoints
pub fn create_router<C: Connector>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health::health_check::<C>))
        .route("/ws/trigger-update", get(trigger::trigger_update::<C>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
