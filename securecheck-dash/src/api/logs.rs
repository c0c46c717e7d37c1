//! Traffic stop log API
//!
//! Paginated browse of the full `traffic_stops` table and submission of
//! new stops from the form.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use securecheck_common::db::{TrafficStopRecord, TRAFFIC_STOPS_TABLE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::TableResult;
use crate::error::DashboardError;
use crate::ingest::{self, StopForm};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters for log browsing
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// One page of the log table
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub table_name: String,
    pub total_rows: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Page statement; the order is total over every column so pages never
/// overlap or skip rows
const LOGS_PAGE_SQL: &str = "SELECT * FROM traffic_stops \
     ORDER BY stop_date, stop_time, vehicle_number, country_name, driver_gender, \
     driver_age, driver_race, search_conducted, search_type, is_arrested, \
     violation, stop_duration, drugs_related_stop \
     LIMIT ? OFFSET ?";

const LOGS_COUNT_SQL: &str = "SELECT COUNT(*) AS total FROM traffic_stops";

/// GET /api/logs
///
/// The row count and the page are read from one snapshot, so `total_rows`
/// always agrees with `rows`.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, DashboardError> {
    let mut page = query.page.max(1);

    loop {
        let (total_rows, table) = read_page(&state, page).await?;
        let p = calculate_pagination(total_rows, page);

        // Requested page was past the end; fetch the last one instead
        if p.page != page {
            page = p.page;
            continue;
        }

        return Ok(Json(LogsResponse {
            table_name: TRAFFIC_STOPS_TABLE.to_string(),
            total_rows,
            page: p.page,
            page_size: PAGE_SIZE,
            total_pages: p.total_pages,
            columns: table.columns,
            rows: table.rows,
        }));
    }
}

async fn read_page(state: &AppState, page: i64) -> Result<(i64, TableResult), DashboardError> {
    let offset = (page - 1) * PAGE_SIZE;

    let mut tables = state
        .store
        .execute_queries(vec![
            sqlx::query(LOGS_COUNT_SQL),
            sqlx::query(LOGS_PAGE_SQL).bind(PAGE_SIZE).bind(offset),
        ])
        .await?
        .into_iter();

    let total_rows = tables
        .next()
        .and_then(|count| count.value(0, "total").and_then(Value::as_i64))
        .unwrap_or(0);
    let table = tables.next().unwrap_or_default();

    Ok((total_rows, table))
}

#[derive(Debug, Serialize)]
pub struct AddLogResponse {
    pub message: String,
    pub summary: String,
    pub record: TrafficStopRecord,
}

/// POST /api/logs
///
/// Returns 201 with the stored record and its summary sentence.
pub async fn add_log(
    State(state): State<AppState>,
    Json(form): Json<StopForm>,
) -> Result<(StatusCode, Json<AddLogResponse>), DashboardError> {
    let inserted = ingest::submit(&state.store, form).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddLogResponse {
            message: "Log added successfully".to_string(),
            summary: inserted.summary,
            record: inserted.record,
        }),
    ))
}
