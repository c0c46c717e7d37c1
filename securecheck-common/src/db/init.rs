//! Schema bootstrap for the `traffic_stops` store
//!
//! Idempotent: safe to run against a database that already has the table.
//! Boolean-like columns are text so both the form's `1`/`0` and legacy
//! `'TRUE'`/`'Yes'` encodings fit.

use crate::Result;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{info, warn};

const CREATE_TRAFFIC_STOPS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS traffic_stops (
        stop_date DATE,
        stop_time TIME,
        country_name VARCHAR(100),
        driver_gender VARCHAR(10),
        driver_age INT,
        driver_race VARCHAR(50),
        search_conducted VARCHAR(10),
        search_type VARCHAR(100),
        is_arrested VARCHAR(10),
        violation VARCHAR(100),
        stop_duration INT,
        drugs_related_stop VARCHAR(10),
        vehicle_number VARCHAR(50)
    )
"#;

/// Create `traffic_stops` on an open connection if it does not exist
pub async fn ensure_schema(conn: &mut MySqlConnection) -> Result<()> {
    sqlx::query(CREATE_TRAFFIC_STOPS_SQL).execute(&mut *conn).await?;
    Ok(())
}

/// Open a connection, ensure the schema, and close the connection
pub async fn init_database(options: &MySqlConnectOptions) -> Result<()> {
    let mut conn = MySqlConnection::connect_with(options).await?;

    let result = ensure_schema(&mut conn).await;

    if let Err(e) = conn.close().await {
        warn!("Failed to close schema bootstrap connection: {}", e);
    }

    if result.is_ok() {
        info!("traffic_stops table is present");
    }
    result
}
