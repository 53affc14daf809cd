//! rcp-ingest library interface
//!
//! Exposes the router and pipeline stages for the binary and for integration
//! testing.

pub mod api;
pub mod error;
pub mod ingest;
pub mod normalizer;
pub mod persist;
pub mod processor;
pub mod tabulator;
pub mod upload;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use rcp_common::config::DEFAULT_MAX_UPLOAD_BYTES;
use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::persist::ResultPersister;
use crate::processor::RecipeProcessor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Domain routine invoked once per request
    pub processor: Arc<dyn RecipeProcessor>,
    /// Writes result artifacts
    pub persister: ResultPersister,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(processor: Arc<dyn RecipeProcessor>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            processor,
            persister: ResultPersister::new(results_dir),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
///
/// Panics inside handlers are turned into the standard 500 error envelope.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::process_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .with_state(state)
}
