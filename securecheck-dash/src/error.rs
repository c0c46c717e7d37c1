//! Dashboard error type and its HTTP mapping
//!
//! Every failure is recovered at the boundary of the request that caused
//! it and reported as `{"error": message}`. None is fatal to the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Connection or execution failure at the store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Catalog lookup miss
    #[error("Unknown query: {0}")]
    UnknownLabel(String),

    /// Form value rejected before reaching the store
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Insert reported success but persisted no row
    #[error("Insert affected {0} rows, expected 1")]
    NotInserted(u64),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::Store(StoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::Store(StoreError::Execution(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::UnknownLabel(_) => StatusCode::NOT_FOUND,
            DashboardError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            DashboardError::NotInserted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!("{}", message);
        } else {
            warn!("{}", message);
        }

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
