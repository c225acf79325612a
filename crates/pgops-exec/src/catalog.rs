//! Catalog browsing and raw SQL execution

use std::time::Instant;

use pgops_ir::{ObjectType, QueryResult, Row};
use pgops_sql::{is_read_only_statement, CompiledQuery, SqlBuilder};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::{elapsed_ms, run, OperationError, SqlDriver};

pub struct CatalogOperations<'a> {
    driver: &'a dyn SqlDriver,
    builder: SqlBuilder,
}

impl<'a> CatalogOperations<'a> {
    pub fn new(driver: &'a dyn SqlDriver) -> Self {
        Self {
            driver,
            builder: SqlBuilder::new(driver.placeholder_style()),
        }
    }

    async fn rows(&self, query: CompiledQuery) -> Result<Vec<Row>, OperationError> {
        Ok(run(self.driver, Ok(query)).await?.rows)
    }

    pub async fn list_schemas(&self) -> QueryResult {
        let start = Instant::now();
        info!("Listing schemas");

        match self.rows(self.builder.list_schemas()).await {
            Ok(rows) => {
                let message = format!("Found {} schema(s)", rows.len());
                QueryResult::success(rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error listing schemas: {}", e);
                QueryResult::failure(format!("Failed to list schemas: {}", e), elapsed_ms(start))
            }
        }
    }

    pub async fn list_objects(&self, schema: &str, object_type: ObjectType) -> QueryResult {
        let start = Instant::now();
        info!("Listing {} objects in {}", object_type, schema);

        match self.rows(self.builder.list_objects(schema, object_type)).await {
            Ok(rows) => {
                let message = format!("Found {} {} object(s)", rows.len(), object_type);
                QueryResult::success(rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error listing {} objects in {}: {}", object_type, schema, e);
                QueryResult::failure(format!("Failed to list objects: {}", e), elapsed_ms(start))
            }
        }
    }

    /// A single row describing the object; no rows when it does not exist.
    ///
    /// Tables and views carry `basic`, `columns`, `constraints` and `indexes`.
    pub async fn get_object_details(&self, schema: &str, name: &str, object_type: ObjectType) -> QueryResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, name);
        info!("Getting details of {} {}", object_type, target);

        let details = match object_type {
            ObjectType::Table | ObjectType::View => self.relation_details(schema, name, object_type).await,
            ObjectType::Sequence => self.rows(self.builder.sequence_details(schema, name)).await,
            ObjectType::Extension => self.rows(self.builder.extension_details(name)).await,
        };

        match details {
            Ok(rows) if rows.is_empty() => {
                QueryResult::success(rows, format!("No {} named {} found", object_type, target), elapsed_ms(start))
            }
            Ok(rows) => QueryResult::success(
                rows,
                format!("Details retrieved for {} {}", object_type, target),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error getting details of {} {}: {}", object_type, target, e);
                QueryResult::failure(format!("Failed to get object details: {}", e), elapsed_ms(start))
            }
        }
    }

    async fn relation_details(
        &self,
        schema: &str,
        name: &str,
        object_type: ObjectType,
    ) -> Result<Vec<Row>, OperationError> {
        let columns = self.rows(self.builder.object_columns(schema, name)).await?;
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let constraints = self.rows(self.builder.object_constraints(schema, name)).await?;
        let indexes = self.rows(self.builder.object_indexes(schema, name)).await?;

        let mut details = Row::new();
        details.insert(
            "basic".to_string(),
            json!({"schema": schema, "name": name, "type": object_type.name()}),
        );
        details.insert("columns".to_string(), rows_value(columns));
        details.insert("constraints".to_string(), group_constraints(constraints));
        details.insert("indexes".to_string(), rows_value(indexes));
        Ok(vec![details])
    }

    /// Run caller-written SQL without parameters.
    ///
    /// A read-only driver only accepts statements that begin with a
    /// non-writing keyword.
    pub async fn execute_sql(&self, sql: &str) -> QueryResult {
        let start = Instant::now();
        info!("Executing SQL");

        if self.driver.read_only() && !is_read_only_statement(sql) {
            warn!("Rejected writing statement in read-only mode");
            return QueryResult::failure(
                "Failed to execute SQL: only SELECT, WITH, SHOW, EXPLAIN, VALUES and TABLE \
                 statements are allowed in restricted mode",
                elapsed_ms(start),
            );
        }

        match run(self.driver, Ok(CompiledQuery::text(sql))).await {
            Ok(output) => {
                let message = if output.rows.is_empty() && output.rows_affected > 0 {
                    format!("Statement executed, {} row(s) affected", output.rows_affected)
                } else {
                    format!("Statement executed, {} row(s) returned", output.rows.len())
                };
                QueryResult::success(output.rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error executing SQL: {}", e);
                QueryResult::failure(format!("Failed to execute SQL: {}", e), elapsed_ms(start))
            }
        }
    }
}

fn rows_value(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// Folds one-row-per-key-column results into `{name, type, columns}` entries
fn group_constraints(rows: Vec<Row>) -> Value {
    let mut grouped: Map<String, Value> = Map::new();

    for row in rows {
        let Some(name) = row.get("constraint_name").and_then(Value::as_str) else {
            continue;
        };
        let entry = grouped.entry(name.to_string()).or_insert_with(|| {
            json!({
                "name": name,
                "type": row.get("constraint_type").cloned().unwrap_or(Value::Null),
                "columns": [],
            })
        });
        if let (Some(column), Some(Value::Array(columns))) =
            (row.get("column_name").filter(|c| !c.is_null()), entry.get_mut("columns"))
        {
            columns.push(column.clone());
        }
    }

    Value::Array(grouped.into_iter().map(|(_, entry)| entry).collect())
}
