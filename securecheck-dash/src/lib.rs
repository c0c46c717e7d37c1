//! securecheck-dash library - traffic stop dashboard
//!
//! Browse the `traffic_stops` log, run canned analytical queries, and add
//! new stops through a form. All computation happens in the store; this
//! crate passes statements through and renders what comes back.

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod db;
pub mod error;
pub mod ingest;
pub mod pagination;

use db::Store;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Connection parameters; each request opens its own connection
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/queries", get(api::list_queries))
        .route("/api/queries/run", post(api::run_query))
        .route("/api/logs", get(api::list_logs).post(api::add_log))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
