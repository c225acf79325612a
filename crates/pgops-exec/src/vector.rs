//! pgvector tables, inserts, searches and index maintenance

use std::time::Instant;

use pgops_ir::{
    OperationResult, OperationType, QueryResult, Row, VectorIndexSpec, VectorSearchOptions, VectorTableSpec,
};
use pgops_sql::SqlBuilder;
use tracing::{debug, error, info};

use crate::{elapsed_ms, run, run_insert, InsertProgress, OperationError, SqlDriver};

pub struct VectorOperations<'a> {
    driver: &'a dyn SqlDriver,
    builder: SqlBuilder,
}

impl<'a> VectorOperations<'a> {
    pub fn new(driver: &'a dyn SqlDriver) -> Self {
        Self {
            driver,
            builder: SqlBuilder::new(driver.placeholder_style()),
        }
    }

    pub async fn create_vector_table(&self, spec: &VectorTableSpec) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", spec.schema, spec.table_name);
        info!(
            "Creating vector table: {} with {}D {}",
            target, spec.vector_dimensions, spec.vector_column
        );

        match run(self.driver, self.builder.create_vector_table(spec)).await {
            Ok(_) => OperationResult::success(
                OperationType::Create,
                &target,
                format!(
                    "Vector table {} created successfully with {}D {} column",
                    target, spec.vector_dimensions, spec.vector_column
                ),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error creating vector table {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Create,
                    target,
                    format!("Failed to create vector table: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn insert_vector_data(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        vectors: &[Vec<f32>],
        additional_data: &[Row],
        returning: &[String],
    ) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);
        let mut progress = InsertProgress::default();

        let outcome: Result<(), OperationError> =
            match self
                .builder
                .insert_vectors(schema, table, vector_column, vectors, additional_data, returning)
            {
                Ok(statement) => {
                    info!("Inserting {} vector record(s) into {}", statement.rows.len(), target);
                    debug!("SQL: {}", statement.sql);
                    run_insert(self.driver, &statement, &mut progress).await.map_err(Into::into)
                }
                Err(e) => Err(e.into()),
            };

        match outcome {
            Ok(()) => OperationResult::success(
                OperationType::Insert,
                &target,
                format!("Successfully inserted {} vector record(s) into {}", progress.completed, target),
                elapsed_ms(start),
            )
            .with_affected_rows(progress.completed)
            .with_returned_data(progress.returned),
            Err(e) => {
                error!("Error inserting vector data into {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Insert,
                    target,
                    format!("Failed to insert vector data: {}", e),
                    elapsed_ms(start),
                )
                .with_affected_rows(progress.completed)
            }
        }
    }

    pub async fn vector_similarity_search(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        options: &VectorSearchOptions,
        additional_columns: &[String],
    ) -> QueryResult {
        let start = Instant::now();
        info!("Vector similarity search in {}.{}", schema, table);
        debug!("Search vector dimensions: {}", options.vector.len());

        let query = self
            .builder
            .similarity_search(schema, table, vector_column, options, additional_columns);
        match run(self.driver, query).await {
            Ok(output) => {
                let message = format!("Vector similarity search completed, found {} results", output.rows.len());
                QueryResult::success(output.rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error in vector similarity search: {}", e);
                QueryResult::failure(format!("Vector similarity search failed: {}", e), elapsed_ms(start))
            }
        }
    }

    /// `options.limit` is k; a threshold is not applied
    pub async fn vector_knn_search(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        options: &VectorSearchOptions,
        additional_columns: &[String],
    ) -> QueryResult {
        let start = Instant::now();
        info!("Vector KNN search (k={}) in {}.{}", options.limit, schema, table);
        debug!("Search vector dimensions: {}", options.vector.len());

        let query = self
            .builder
            .knn_search(schema, table, vector_column, options, additional_columns);
        match run(self.driver, query).await {
            Ok(output) => {
                let message = format!(
                    "Vector KNN search completed, found {} nearest neighbors",
                    output.rows.len()
                );
                QueryResult::success(output.rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error in vector KNN search: {}", e);
                QueryResult::failure(format!("Vector KNN search failed: {}", e), elapsed_ms(start))
            }
        }
    }

    pub async fn create_vector_index(&self, spec: &VectorIndexSpec) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", spec.schema, spec.table_name);
        let name = spec.resolved_name();
        info!("Creating vector index: {} on {}.{}", name, target, spec.vector_column);

        match run(self.driver, self.builder.create_vector_index(spec)).await {
            Ok(_) => OperationResult::success(
                OperationType::Create,
                &target,
                format!("Vector index {} created successfully using {}", name, spec.method),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error creating vector index {}: {}", name, e);
                OperationResult::failure(
                    OperationType::Create,
                    target,
                    format!("Failed to create vector index: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }

    pub async fn get_vector_index_stats(&self, schema: &str, table: &str, vector_column: &str) -> QueryResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, table);

        match run(self.driver, Ok(self.builder.index_stats(schema, table, vector_column))).await {
            Ok(output) => {
                info!("Retrieved vector index stats for {}.{}", target, vector_column);
                let message = format!("Vector index statistics retrieved for {}", target);
                QueryResult::success(output.rows, message, elapsed_ms(start))
            }
            Err(e) => {
                error!("Error getting vector index stats: {}", e);
                QueryResult::failure(format!("Failed to get vector index stats: {}", e), elapsed_ms(start))
            }
        }
    }

    /// Rebuilds the index with `REINDEX`
    pub async fn optimize_vector_index(&self, schema: &str, index: &str) -> OperationResult {
        let start = Instant::now();
        let target = format!("{}.{}", schema, index);
        info!("Optimizing vector index: {}", target);

        match run(self.driver, self.builder.reindex(schema, index)).await {
            Ok(_) => OperationResult::success(
                OperationType::Update,
                &target,
                format!("Vector index {} optimized successfully", target),
                elapsed_ms(start),
            ),
            Err(e) => {
                error!("Error optimizing vector index {}: {}", target, e);
                OperationResult::failure(
                    OperationType::Update,
                    target,
                    format!("Failed to optimize vector index: {}", e),
                    elapsed_ms(start),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDriver;
    use pgops_ir::{DistanceFunction, IndexMethod};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_vector_table() {
        let driver = RecordingDriver::new();

        let result = VectorOperations::new(&driver)
            .create_vector_table(&VectorTableSpec::new("items", 3))
            .await;

        assert!(result.success);
        assert_eq!(
            result.message,
            "Vector table public.items created successfully with 3D embedding column"
        );
        assert!(driver.statements()[0].contains("\"embedding\" vector(3)"));
    }

    #[tokio::test]
    async fn test_insert_then_search_scenario() {
        let driver = RecordingDriver::new();
        let ops = VectorOperations::new(&driver);

        let inserted = ops
            .insert_vector_data(
                "public",
                "items",
                "embedding",
                &[vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]],
                &[],
                &[],
            )
            .await;
        assert!(inserted.success);
        assert_eq!(inserted.affected_rows, Some(2));

        driver.respond_rows(vec![json!({"id": 1, "distance": 0.0})]);
        let options = VectorSearchOptions::new(vec![0.0, 0.0, 0.0])
            .distance(DistanceFunction::Euclidean)
            .limit(1);
        let found = ops
            .vector_similarity_search("public", "items", "embedding", &options, &[])
            .await;

        assert!(found.success);
        assert_eq!(found.message, "Vector similarity search completed, found 1 results");
        assert_eq!(found.data[0].get("distance"), Some(&json!(0.0)));

        let calls = driver.calls();
        assert_eq!(calls[0].1, vec![json!("[0,0,0]")]);
        assert_eq!(calls[1].1, vec![json!("[1,1,1]")]);
        assert_eq!(
            calls[2].0,
            "SELECT \"id\", \"embedding\" <-> $1::vector AS distance FROM \"public\".\"items\" \
             ORDER BY \"embedding\" <-> $2::vector LIMIT $3"
        );
    }

    #[tokio::test]
    async fn test_search_with_empty_vector_fails_without_driver() {
        let driver = RecordingDriver::new();

        let result = VectorOperations::new(&driver)
            .vector_knn_search("public", "items", "embedding", &VectorSearchOptions::new(vec![]), &[])
            .await;

        assert!(!result.success);
        assert_eq!(result.message, "Vector KNN search failed: Search vector must not be empty");
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_vector_index_rejects_btree() {
        let driver = RecordingDriver::new();
        let spec = VectorIndexSpec::new("items").using(IndexMethod::Btree);

        let result = VectorOperations::new(&driver).create_vector_index(&spec).await;

        assert!(!result.success);
        assert!(result.message.starts_with("Failed to create vector index: Unsupported vector index method: btree"));
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_vector_index_message() {
        let driver = RecordingDriver::new();

        let result = VectorOperations::new(&driver)
            .create_vector_index(&VectorIndexSpec::new("items"))
            .await;

        assert!(result.success);
        assert_eq!(result.message, "Vector index idx_items_embedding_hnsw created successfully using hnsw");
    }

    #[tokio::test]
    async fn test_index_stats_and_optimize() {
        let driver = RecordingDriver::new();
        driver.respond_rows(vec![json!({"indexname": "idx_items_embedding_hnsw", "index_method": "hnsw"})]);
        let ops = VectorOperations::new(&driver);

        let stats = ops.get_vector_index_stats("public", "items", "embedding").await;
        let optimized = ops.optimize_vector_index("public", "idx_items_embedding_hnsw").await;

        assert!(stats.success);
        assert_eq!(stats.columns, vec!["indexname", "index_method"]);
        assert_eq!(driver.calls()[0].1, vec![json!("public"), json!("items"), json!("%embedding%")]);

        assert!(optimized.success);
        assert_eq!(optimized.operation_type, OperationType::Update);
        assert_eq!(
            driver.statements()[1],
            "REINDEX INDEX \"public\".\"idx_items_embedding_hnsw\""
        );
    }
}
