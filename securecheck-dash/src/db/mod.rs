//! Data access layer for securecheck-dash
//!
//! Run read statements (one, or several against one snapshot) and run a
//! write statement.
//! Every call opens its own connection and closes it before returning,
//! on success and on failure alike. No pooling.

use securecheck_common::config::StoreConfig;
use serde::Serialize;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection};
use sqlx::query::Query;
use sqlx::{Column, Connection, Execute, Executor, Row, Statement};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

mod values;
pub use values::column_value;

/// Data access failures
///
/// Connection and execution failures are kept apart so callers can tell
/// "store unreachable" from "statement rejected".
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable, authentication rejected, or connect timed out
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Malformed statement or constraint violation at the store
    #[error("Statement execution failed: {0}")]
    Execution(String),
}

/// Rows returned by a read statement, in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, if both exist
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// Handle to the configured store
///
/// Holds connection parameters only; no connection outlives a single call.
#[derive(Clone)]
pub struct Store {
    options: MySqlConnectOptions,
    connect_timeout: Duration,
}

impl Store {
    pub fn new(config: &StoreConfig) -> Self {
        Self::from_options(config.connect_options(), config.connect_timeout())
    }

    pub fn from_options(options: MySqlConnectOptions, connect_timeout: Duration) -> Self {
        Self {
            options,
            connect_timeout,
        }
    }

    /// Run a read statement and collect every row
    ///
    /// Zero rows is a successful result; its column names come from
    /// preparing the statement.
    pub async fn execute_query<'q>(
        &self,
        statement: Query<'q, MySql, MySqlArguments>,
    ) -> Result<TableResult, StoreError> {
        let mut conn = self.connect().await?;
        let result = fetch_table(&mut conn, statement).await;
        release(conn).await;
        result
    }

    /// Run several read statements against one snapshot
    ///
    /// All statements share one connection and one transaction, so each
    /// sees the table as of the first read. Results come back in statement
    /// order.
    pub async fn execute_queries<'q>(
        &self,
        statements: Vec<Query<'q, MySql, MySqlArguments>>,
    ) -> Result<Vec<TableResult>, StoreError> {
        let mut conn = self.connect().await?;
        let result = fetch_snapshot(&mut conn, statements).await;
        release(conn).await;
        result
    }

    /// Run a write statement inside a transaction and commit it
    ///
    /// Returns the number of affected rows. A failed statement is rolled
    /// back, so nothing is persisted.
    pub async fn execute_write<'q>(
        &self,
        statement: Query<'q, MySql, MySqlArguments>,
    ) -> Result<u64, StoreError> {
        let mut conn = self.connect().await?;
        let result = write_in_transaction(&mut conn, statement).await;
        release(conn).await;
        result
    }

    async fn connect(&self) -> Result<MySqlConnection, StoreError> {
        let connecting = MySqlConnection::connect_with(&self.options);
        match tokio::time::timeout(self.connect_timeout, connecting).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(StoreError::Connection(e.to_string())),
            Err(_) => Err(StoreError::Connection(format!(
                "timed out after {} s",
                self.connect_timeout.as_secs()
            ))),
        }
    }
}

async fn fetch_table<'q>(
    conn: &mut MySqlConnection,
    statement: Query<'q, MySql, MySqlArguments>,
) -> Result<TableResult, StoreError> {
    let sql = statement.sql();

    let rows = statement.fetch_all(&mut *conn).await.map_err(execution)?;

    let columns: Vec<String> = match rows.first() {
        Some(first) => first
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect(),
        None => {
            let prepared = (&mut *conn).prepare(sql).await.map_err(execution)?;
            prepared
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect()
        }
    };

    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| column_value(row, i)).collect())
        .collect();

    debug!("Fetched {} rows ({} columns)", rows.len(), columns.len());

    Ok(TableResult { columns, rows })
}

async fn fetch_snapshot<'q>(
    conn: &mut MySqlConnection,
    statements: Vec<Query<'q, MySql, MySqlArguments>>,
) -> Result<Vec<TableResult>, StoreError> {
    let mut tx = conn.begin().await.map_err(execution)?;

    let mut tables = Vec::with_capacity(statements.len());
    for statement in statements {
        match fetch_table(&mut *tx, statement).await {
            Ok(table) => tables.push(table),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed: {}", rollback_err);
                }
                return Err(e);
            }
        }
    }

    // Read-only, nothing to commit
    tx.rollback().await.map_err(execution)?;

    Ok(tables)
}

async fn write_in_transaction<'q>(
    conn: &mut MySqlConnection,
    statement: Query<'q, MySql, MySqlArguments>,
) -> Result<u64, StoreError> {
    let mut tx = conn.begin().await.map_err(execution)?;

    let done = match statement.execute(&mut *tx).await {
        Ok(done) => done,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            return Err(execution(e));
        }
    };

    tx.commit().await.map_err(execution)?;

    Ok(done.rows_affected())
}

async fn release(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close store connection: {}", e);
    }
}

fn execution(e: sqlx::Error) -> StoreError {
    StoreError::Execution(e.to_string())
}
