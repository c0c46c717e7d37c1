//! Canned query catalog API
//!
//! Lists catalog labels for the selector and runs the statement bound to a
//! selected label.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{self, QueryCategory};
use crate::error::DashboardError;
use crate::AppState;

/// One selector option
#[derive(Debug, Serialize)]
pub struct QueryListing {
    pub label: &'static str,
    pub category: QueryCategory,
    pub category_title: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QueryListResponse {
    pub queries: Vec<QueryListing>,
}

/// GET /api/queries
///
/// Catalog entries in definition order, grouped by category.
pub async fn list_queries() -> Json<QueryListResponse> {
    let queries = catalog::entries()
        .iter()
        .map(|entry| QueryListing {
            label: entry.label,
            category: entry.category,
            category_title: entry.category.title(),
        })
        .collect();

    Json(QueryListResponse { queries })
}

#[derive(Debug, Deserialize)]
pub struct RunQueryRequest {
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct RunQueryResponse {
    pub label: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// POST /api/queries/run
///
/// Zero rows is a 200 with `row_count: 0`, never an error.
pub async fn run_query(
    State(state): State<AppState>,
    Json(request): Json<RunQueryRequest>,
) -> Result<Json<RunQueryResponse>, DashboardError> {
    let table = catalog::run(&state.store, &request.label).await?;

    Ok(Json(RunQueryResponse {
        label: request.label,
        row_count: table.row_count(),
        columns: table.columns,
        rows: table.rows,
    }))
}
