//! labelcheck-core: supplement label structuring, ingredient form matching,
//! UL warnings and form-coverage diagnostics
//!
//! The label and form stages are pure functions over in-memory data. Only
//! the OCR client and the SQLite-backed stores in [`services`] do I/O.

pub mod api;
pub mod diagnostics;
pub mod error;
pub mod forms;
pub mod label;
pub mod models;
pub mod services;
pub mod ul;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use services::ReferenceStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use ul::UlCalculator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only taxonomy lookups
    pub reference: Arc<dyn ReferenceStore>,
    /// UL classifier with the configured moderate threshold
    pub ul: UlCalculator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(reference: Arc<dyn ReferenceStore>, ul: UlCalculator) -> Self {
        Self {
            reference,
            ul,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::label_routes())
        .merge(api::form_routes())
        .merge(api::ul_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
