//! Table creation and record CRUD

use std::time::Instant;

use pgops_ir::{OperationResult, OperationType, QueryCondition, QueryOptions, QueryResult, Row, TableDefinition};
use pgops_sql::SqlBuilder;
use tracing::{debug, error, info};

use crate::{elapsed_ms, run, run_insert, InsertProgress, OperationError, SqlDriver};

pub struct CrudOperations<'a> {
    driver: &'a dyn SqlDriver,
    builder: SqlBuilder,
}

impl<'a> CrudOperations<'a> {
    pub fn new(driver: &'a dyn SqlDriver) -> Self {
        Self {
            driver,
            builder: SqlBuilder::new(driver.placeholder_style()),
        }
    }

    pub async fn create_table(&self, table: &TableDefinition) -> OperationResult {
        let start = Instant::now();
        let target = table.qualified_name();
        info!("Creating table: {}", target);

        match run(self.driver, self.builder.create_table(table)).await {
            Ok(_) => OperationResult::success(
                OperationType::Create,
                &target,
                format!("Table {} created successfully", target),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error creating table {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Create,
                    target,
                    format!("Failed to create table: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    /// `affected_rows` counts records inserted, including on failure
    pub async fn insert_records(
        &self,
        schema: &str,
        table: &str,
        records: &[Row],
        returning: &[String],
    ) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);
        let mut progress = InsertProgress::default();

        let outcome: Result<(), OperationError> = match self.builder.insert(schema, table, records, returning) {
            Ok(statement) => {
                info!("Inserting {} record(s) into {}", statement.rows.len(), target);
                debug!("SQL: {}", statement.sql);
                run_insert(self.driver, &statement, &mut progress).await.map_err(Into::into)
            }
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(()) => OperationResult::success(
                OperationType::Insert,
                &target,
                format!("Successfully inserted {} record(s) into {}", progress.completed, target),
                elapsed_ms(start),
            )
            .with_affected_rows(progress.completed)
            .with_returned_data(progress.returned),
            Err(e) => {
                error!("Error inserting records into {} after {} row(s): {}", target, progress.completed, e);
                OperationResult::failure(
                    OperationType::Insert,
                    target,
                    format!("Failed to insert records: {}", e),
                    elapsed_ms(start),
                )
                .with_affected_rows(progress.completed)
            }
        }
    }

    pub async fn update_records(
        &self,
        schema: &str,
        table: &str,
        data: &Row,
        conditions: &[QueryCondition],
        returning: &[String],
    ) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);
        info!("Updating records in {}", target);

        match run(self.driver, self.builder.update(schema, table, data, conditions, returning)).await {
            Ok(output) => OperationResult::success(
                OperationType::Update,
                &target,
                format!("Successfully updated {} record(s) in {}", output.rows_affected, target),
                elapsed_ms(start),
            )
            .with_affected_rows(output.rows_affected)
            .with_returned_data(output.rows),
            Err(e) => {
                error!("Error updating records in {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Update,
                    target,
                    format!("Failed to update records: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn delete_records(
        &self,
        schema: &str,
        table: &str,
        conditions: &[QueryCondition],
        returning: &[String],
    ) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);
        info!("Deleting records from {}", target);

        match run(self.driver, self.builder.delete(schema, table, conditions, returning)).await {
            Ok(output) => OperationResult::success(
                OperationType::Delete,
                &target,
                format!("Successfully deleted {} record(s) from {}", output.rows_affected, target),
                elapsed_ms(start),
            )
            .with_affected_rows(output.rows_affected)
            .with_returned_data(output.rows),
            Err(e) => {
                error!("Error deleting records from {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Delete,
                    target,
                    format!("Failed to delete records: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    /// Empty `columns` selects every column
    pub async fn query_records(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        conditions: &[QueryCondition],
        options: &QueryOptions,
    ) -> QueryResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);
        info!("Querying records from {}", target);

        match run(self.driver, self.builder.select(schema, table, columns, conditions, options)).await {
            Ok(output) => {
                let message = format!("Successfully queried {} record(s) from {}", output.rows.len(), target);
                QueryResult::success(output.rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error querying records from {}: {}", target, e);
                QueryResult::failure(format!("Failed to query records: {}", e), elapsed_ms(start))
            }
        }
    }
}
