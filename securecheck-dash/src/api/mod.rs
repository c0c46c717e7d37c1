//! HTTP API handlers for securecheck-dash

pub mod buildinfo;
pub mod health;
pub mod logs;
pub mod queries;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use logs::{add_log, list_logs};
pub use queries::{list_queries, run_query};
pub use ui::{serve_app_js, serve_index};
