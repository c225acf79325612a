//! Execution layer - runs compiled statements through an injected driver
//!
//! Every public operation is timed and returns an [`OperationResult`] or
//! [`QueryResult`]; build and driver errors become `success: false` results
//! and never escape as `Err`.
//!
//! [`OperationResult`]: pgops_ir::OperationResult
//! [`QueryResult`]: pgops_ir::QueryResult

use std::time::Instant;

use async_trait::async_trait;
use pgops_ir::Row;
use pgops_sql::{BuildError, CompiledQuery, InsertStatement};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

mod catalog;
mod crud;
mod schema;
mod vector;

#[cfg(test)]
mod testing;

pub use catalog::CatalogOperations;
pub use crud::CrudOperations;
pub use pgops_sql::PlaceholderStyle;
pub use schema::SchemaOperations;
pub use vector::VectorOperations;

/// Error reported by the database driver, message kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DriverError(pub String);

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Rows produced by one statement plus the command's row count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    /// Rows touched by INSERT/UPDATE/DELETE, rows returned by SELECT
    pub rows_affected: u64,
}

impl QueryOutput {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let rows_affected = rows.len() as u64;
        Self { rows, rows_affected }
    }
}

/// Executes one parameterized statement
#[async_trait]
pub trait SqlDriver: Send + Sync {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DriverError>;

    /// Placeholder syntax the driver binds
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    /// Whether every statement runs in a read-only transaction
    fn read_only(&self) -> bool {
        false
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Execute a freshly built statement, surfacing build errors first
pub(crate) async fn run(
    driver: &dyn SqlDriver,
    query: Result<CompiledQuery, BuildError>,
) -> Result<QueryOutput, OperationError> {
    let query = query?;
    debug!("SQL: {}", query.sql);
    Ok(driver.execute(&query.sql, &query.params).await?)
}

/// Rows completed so far and whatever they returned, kept on failure too
#[derive(Debug, Default)]
pub(crate) struct InsertProgress {
    pub completed: u64,
    pub returned: Vec<Row>,
}

/// One statement per record; stops at the first failing row
pub(crate) async fn run_insert(
    driver: &dyn SqlDriver,
    statement: &InsertStatement,
    progress: &mut InsertProgress,
) -> Result<(), DriverError> {
    for row in &statement.rows {
        let output = driver.execute(&statement.sql, row).await?;
        progress.completed += 1;
        progress.returned.extend(output.rows);
    }
    Ok(())
}
