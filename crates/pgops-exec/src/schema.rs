//! Schema, table, index and extension management

use std::time::Instant;

use pgops_ir::{IndexDefinition, OperationResult, OperationType};
use pgops_sql::SqlBuilder;
use tracing::{error, info, warn};

use crate::{elapsed_ms, run, SqlDriver};

pub struct SchemaOperations<'a> {
    driver: &'a dyn SqlDriver,
    builder: SqlBuilder,
}

impl<'a> SchemaOperations<'a> {
    pub fn new(driver: &'a dyn SqlDriver) -> Self {
        Self {
            driver,
            builder: SqlBuilder::new(driver.placeholder_style()),
        }
    }

    pub async fn create_schema(&self, schema: &str, if_not_exists: bool) -> OperationResult {
        let start = Instant::now();
        info!("Creating schema: {}", schema);

        match run(self.driver, self.builder.create_schema(schema, if_not_exists)).await {
            Ok(_) => OperationResult::success(
                OperationType::Create,
                schema,
                format!("Schema {} created successfully", schema),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error creating schema {}: {}", schema, e);
                OperationResult::failure(
                    OperationType::Create,
                    schema,
                    format!("Failed to create schema: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn drop_schema(&self, schema: &str, cascade: bool, if_exists: bool) -> OperationResult {
        let start = Instant::now();
        info!("Dropping schema: {}", schema);

        match run(self.driver, self.builder.drop_schema(schema, if_exists, cascade)).await {
            Ok(_) => OperationResult::success(
                OperationType::Drop,
                schema,
                format!("Schema {} dropped successfully", schema),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error dropping schema {}: {}", schema, e);
                OperationResult::failure(
                    OperationType::Drop,
                    schema,
                    format!("Failed to drop schema: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn drop_table(&self, schema: &str, table: &str, cascade: bool, if_exists: bool) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);
        info!("Dropping table: {}", target);

        match run(self.driver, self.builder.drop_table(schema, table, if_exists, cascade)).await {
            Ok(_) => OperationResult::success(
                OperationType::Drop,
                &target,
                format!("Table {} dropped successfully", target),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error dropping table {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Drop,
                    target,
                    format!("Failed to drop table: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn create_index(&self, index: &IndexDefinition) -> OperationResult {
        let start = Instant::now();
        info!("Creating index {} on {}.{}", index.name, index.schema, index.table_name);
        if !index.method.is_vector() && !index.options.is_empty() {
            warn!(
                "Ignoring {} option(s) on {} index {}; only hnsw and ivfflat take WITH options",
                index.options.len(),
                index.method,
                index.name
            );
        }

        match run(self.driver, self.builder.create_index(index)).await {
            Ok(_) => OperationResult::success(
                OperationType::Create,
                &index.table_name,
                format!("Index {} created successfully", index.name),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error creating index {}: {}", index.name, e);
                OperationResult::failure(
                    OperationType::Create,
                    &index.table_name,
                    format!("Failed to create index: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    /// `schema` qualifies the index name when given; otherwise the search path decides
    pub async fn drop_index(
        &self,
        index: &str,
        schema: Option<&str>,
        if_exists: bool,
        cascade: bool,
    ) -> OperationResult {
        let start = Instant::now();
        info!("Dropping index: {}", index);

        match run(self.driver, self.builder.drop_index(schema, index, if_exists, cascade)).await {
            Ok(_) => OperationResult::success(
                OperationType::Drop,
                index,
                format!("Index {} dropped successfully", index),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error dropping index {}: {}", index, e);
                OperationResult::failure(
                    OperationType::Drop,
                    index,
                    format!("Failed to drop index: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn create_extension(&self, extension: &str, if_not_exists: bool, schema: Option<&str>) -> OperationResult {
        let start = Instant::now();
        info!("Creating extension: {}", extension);

        match run(self.driver, self.builder.create_extension(extension, if_not_exists, schema)).await {
            Ok(_) => OperationResult::success(
                OperationType::Create,
                extension,
                format!("Extension {} created successfully", extension),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error creating extension {}: {}", extension, e);
                OperationResult::failure(
                    OperationType::Create,
                    extension,
                    format!("Failed to create extension: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }
}
