//! HTTP server for the webhook receiver.
//!
//! This module implements the HTTP surface that:
//! - Accepts GitHub webhook deliveries and runs them through the event
//!   pipeline (archive, verify, dispatch)
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `POST /` - Accepts GitHub webhook deliveries
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::events::EventProcessor;

/// Shared application state.
///
/// Passed to all handlers via axum's `State` extractor. The processor holds
/// only read-only configuration plus the append-only activity log, so one
/// instance serves all concurrent requests.
#[derive(Clone)]
pub struct AppState {
    processor: Arc<EventProcessor>,
}

impl AppState {
    /// Wraps a fully configured processor (registry populated, secrets
    /// loaded) for serving.
    pub fn new(processor: EventProcessor) -> Self {
        AppState {
            processor: Arc::new(processor),
        }
    }

    /// Returns the event processor.
    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
