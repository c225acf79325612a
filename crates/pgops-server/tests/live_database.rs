//! End-to-end tests against a real PostgreSQL with pgvector
//!
//! Set `PGOPS_TEST_DATABASE_URL` to run them; each test works in its own
//! scratch schema and drops it afterwards.

use pgops_exec::{CatalogOperations, CrudOperations, SchemaOperations, VectorOperations};
use pgops_ir::{
    ColumnDefinition, DataType, DistanceFunction, ObjectType, QueryCondition, QueryOptions, Row, SortDirection,
    TableDefinition, VectorIndexSpec, VectorSearchOptions, VectorTableSpec,
};
use pgops_server::config::{AccessMode, DatabaseConfig};
use pgops_server::postgres::PostgresDriver;
use serde_json::{json, Value};

async fn connect() -> Option<PostgresDriver> {
    connect_with(AccessMode::Unrestricted).await
}

async fn connect_with(access_mode: AccessMode) -> Option<PostgresDriver> {
    let Ok(url) = std::env::var("PGOPS_TEST_DATABASE_URL") else {
        println!("⚠️  Skipping: PGOPS_TEST_DATABASE_URL not set");
        return None;
    };

    let config = DatabaseConfig {
        url,
        statement_timeout_ms: Some(30_000),
        access_mode,
    };
    match PostgresDriver::connect(&config).await {
        Ok(driver) => Some(driver),
        Err(e) => {
            println!("⚠️  Skipping: cannot connect to test database: {}", e);
            None
        }
    }
}

fn scratch_schema() -> String {
    format!("pgops_test_{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn record(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

async fn with_pgvector(driver: &PostgresDriver) -> bool {
    let result = SchemaOperations::new(driver).create_extension("vector", true, None).await;
    if !result.success {
        println!("⚠️  Skipping: pgvector unavailable: {}", result.message);
    }
    result.success
}

#[tokio::test]
async fn test_insert_update_and_query_roundtrip() {
    let Some(driver) = connect().await else { return };
    let schema = scratch_schema();
    let schema_ops = SchemaOperations::new(&driver);
    let crud = CrudOperations::new(&driver);

    assert!(schema_ops.create_schema(&schema, true).await.success);

    let table = TableDefinition::new(
        "t",
        vec![
            ColumnDefinition::new("id", DataType::Serial).primary_key(),
            ColumnDefinition::new("name", DataType::Text).not_null(),
        ],
    )
    .in_schema(&schema);
    let created = crud.create_table(&table).await;
    assert!(created.success, "{}", created.message);

    // Scenario A
    let returning = vec!["id".to_string(), "name".to_string()];
    let inserted = crud
        .insert_records(
            &schema,
            "t",
            &[record(json!({"name": "a"})), record(json!({"name": "b"}))],
            &returning,
        )
        .await;
    assert!(inserted.success, "{}", inserted.message);
    assert_eq!(inserted.affected_rows, Some(2));
    assert_eq!(inserted.returned_data.len(), 2);
    assert_eq!(inserted.returned_data[0]["name"], json!("a"));
    assert_eq!(inserted.returned_data[1]["name"], json!("b"));
    let first = inserted.returned_data[0]["id"].as_i64().unwrap();
    let second = inserted.returned_data[1]["id"].as_i64().unwrap();
    assert_eq!(second, first + 1);

    // Returned keys find exactly the inserted rows
    let ids: Vec<Value> = inserted.returned_data.iter().map(|row| row["id"].clone()).collect();
    let found = crud
        .query_records(
            &schema,
            "t",
            &[],
            &[QueryCondition::in_list("id", ids)],
            &QueryOptions::new().order_by("id", SortDirection::Asc),
        )
        .await;
    assert!(found.success, "{}", found.message);
    assert_eq!(found.data.len(), 2);
    assert_eq!(found.columns, vec!["id", "name"]);

    // Scenario B
    let updated = crud
        .update_records(
            &schema,
            "t",
            &record(json!({"name": "z"})),
            &[QueryCondition::eq("id", first)],
            &returning,
        )
        .await;
    assert!(updated.success, "{}", updated.message);
    assert_eq!(updated.affected_rows, Some(1));
    assert_eq!(updated.returned_data, vec![record(json!({"id": first, "name": "z"}))]);

    // NOT NULL violation reports the server's message
    let rejected = crud
        .insert_records(&schema, "t", &[record(json!({"name": null}))], &[])
        .await;
    assert!(!rejected.success);
    assert!(rejected.message.starts_with("Failed to insert records: "));
    assert_eq!(rejected.affected_rows, Some(0));

    let deleted = crud
        .delete_records(&schema, "t", &[QueryCondition::eq("name", "b")], &[])
        .await;
    assert_eq!(deleted.affected_rows, Some(1));

    assert!(schema_ops.drop_schema(&schema, true, true).await.success);
}

#[tokio::test]
async fn test_idempotent_ddl_guards() {
    let Some(driver) = connect().await else { return };
    let schema = scratch_schema();
    let ops = SchemaOperations::new(&driver);

    assert!(ops.create_schema(&schema, true).await.success);
    assert!(ops.create_schema(&schema, true).await.success);
    assert!(!ops.create_schema(&schema, false).await.success);

    let missing = format!("{}_missing_idx", schema);
    assert!(ops.drop_index(&missing, Some(schema.as_str()), true, false).await.success);
    assert!(!ops.drop_index(&missing, Some(schema.as_str()), false, false).await.success);
    assert!(ops.drop_table(&schema, "never_created", false, true).await.success);

    assert!(ops.drop_schema(&schema, true, true).await.success);
    assert!(ops.drop_schema(&schema, false, true).await.success);
}

#[tokio::test]
async fn test_vector_nearest_match() {
    let Some(driver) = connect().await else { return };
    if !with_pgvector(&driver).await {
        return;
    }
    let schema = scratch_schema();
    let vectors = VectorOperations::new(&driver);
    assert!(SchemaOperations::new(&driver).create_schema(&schema, true).await.success);

    // Scenario C
    let spec = VectorTableSpec::new("items", 3)
        .in_schema(&schema)
        .column(ColumnDefinition::new("label", DataType::Text));
    let created = vectors.create_vector_table(&spec).await;
    assert!(created.success, "{}", created.message);

    let inserted = vectors
        .insert_vector_data(
            &schema,
            "items",
            "embedding",
            &[vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]],
            &[record(json!({"label": "origin"})), record(json!({"label": "ones"}))],
            &["id".to_string()],
        )
        .await;
    assert!(inserted.success, "{}", inserted.message);
    let origin_id = inserted.returned_data[0]["id"].clone();

    let options = VectorSearchOptions::new(vec![0.0, 0.0, 0.0])
        .distance(DistanceFunction::Euclidean)
        .limit(1);
    let found = vectors
        .vector_similarity_search(&schema, "items", "embedding", &options, &["label".to_string()])
        .await;
    assert!(found.success, "{}", found.message);
    assert_eq!(found.data.len(), 1);
    assert_eq!(found.data[0]["id"], origin_id);
    assert_eq!(found.data[0]["label"], json!("origin"));
    assert_eq!(found.data[0]["distance"].as_f64(), Some(0.0));

    let stored = CrudOperations::new(&driver)
        .query_records(
            &schema,
            "items",
            &["embedding".to_string()],
            &[QueryCondition::eq("label", "ones")],
            &QueryOptions::new(),
        )
        .await;
    assert_eq!(stored.data[0]["embedding"], json!([1.0, 1.0, 1.0]));

    let index = vectors
        .create_vector_index(
            &VectorIndexSpec::new("items")
                .in_schema(&schema)
                .distance(DistanceFunction::Euclidean),
        )
        .await;
    assert!(index.success, "{}", index.message);

    let stats = vectors.get_vector_index_stats(&schema, "items", "embedding").await;
    assert!(stats.success, "{}", stats.message);
    assert_eq!(stats.data.len(), 1);

    let optimized = vectors.optimize_vector_index(&schema, "idx_items_embedding_hnsw").await;
    assert!(optimized.success, "{}", optimized.message);

    assert!(SchemaOperations::new(&driver).drop_schema(&schema, true, true).await.success);
}

#[tokio::test]
async fn test_cosine_ordering_and_threshold() {
    let Some(driver) = connect().await else { return };
    if !with_pgvector(&driver).await {
        return;
    }
    let schema = scratch_schema();
    let vectors = VectorOperations::new(&driver);
    assert!(SchemaOperations::new(&driver).create_schema(&schema, true).await.success);
    assert!(vectors.create_vector_table(&VectorTableSpec::new("docs", 3).in_schema(&schema)).await.success);

    let inserted = vectors
        .insert_vector_data(
            &schema,
            "docs",
            "embedding",
            &[vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0]],
            &[],
            &[],
        )
        .await;
    assert_eq!(inserted.affected_rows, Some(3));

    let query = vec![1.0, 0.0, 0.0];
    let all = vectors
        .vector_knn_search(
            &schema,
            "docs",
            "embedding",
            &VectorSearchOptions::new(query.clone()).limit(10),
            &[],
        )
        .await;
    assert!(all.success, "{}", all.message);
    let distances: Vec<f64> = all.data.iter().filter_map(|row| row["distance"].as_f64()).collect();
    assert_eq!(distances.len(), 3);
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));

    let near = vectors
        .vector_similarity_search(
            &schema,
            "docs",
            "embedding",
            &VectorSearchOptions::new(query).threshold(0.5),
            &[],
        )
        .await;
    assert!(near.success, "{}", near.message);
    assert_eq!(near.data.len(), 2);
    assert!(near.data.iter().all(|row| row["distance"].as_f64().unwrap() < 0.5));

    assert!(SchemaOperations::new(&driver).drop_schema(&schema, true, true).await.success);
}

#[tokio::test]
async fn test_catalog_browsing() {
    let Some(driver) = connect().await else { return };
    let schema = scratch_schema();
    let schema_ops = SchemaOperations::new(&driver);
    let catalog = CatalogOperations::new(&driver);
    assert!(schema_ops.create_schema(&schema, true).await.success);

    let table = TableDefinition::new(
        "accounts",
        vec![
            ColumnDefinition::new("id", DataType::Serial).primary_key(),
            ColumnDefinition::new("email", DataType::Text).not_null().unique(),
            ColumnDefinition::new("balance", DataType::Numeric).default_value(0),
        ],
    )
    .in_schema(&schema);
    assert!(CrudOperations::new(&driver).create_table(&table).await.success);

    let schemas = catalog.list_schemas().await;
    assert!(schemas.success, "{}", schemas.message);
    assert!(schemas.data.iter().any(|row| row["schema_name"] == json!(schema)));

    let tables = catalog.list_objects(&schema, ObjectType::Table).await;
    assert!(tables.success, "{}", tables.message);
    assert_eq!(tables.data.len(), 1);
    assert_eq!(tables.data[0]["name"], json!("accounts"));
    assert_eq!(tables.data[0]["type"], json!("BASE TABLE"));

    let sequences = catalog.list_objects(&schema, ObjectType::Sequence).await;
    assert_eq!(sequences.data.len(), 1);

    let details = catalog.get_object_details(&schema, "accounts", ObjectType::Table).await;
    assert!(details.success, "{}", details.message);
    let info = &details.data[0];
    assert_eq!(info["columns"].as_array().map(Vec::len), Some(3));
    assert_eq!(info["columns"][1]["is_nullable"], json!("NO"));
    let constraint_types: Vec<&Value> = info["constraints"]
        .as_array()
        .map(|items| items.iter().map(|c| &c["type"]).collect())
        .unwrap_or_default();
    assert!(constraint_types.contains(&&json!("PRIMARY KEY")));
    assert!(constraint_types.contains(&&json!("UNIQUE")));
    assert_eq!(info["indexes"].as_array().map(Vec::len), Some(2));

    let inserted = catalog
        .execute_sql(&format!("INSERT INTO \"{}\".accounts (email, balance) VALUES ('a@x', 12.50)", schema))
        .await;
    assert!(inserted.success, "{}", inserted.message);
    let balance = catalog
        .execute_sql(&format!("SELECT balance FROM \"{}\".accounts", schema))
        .await;
    assert_eq!(balance.data[0]["balance"], json!(12.5));

    assert!(schema_ops.drop_schema(&schema, true, true).await.success);
}

#[tokio::test]
async fn test_restricted_mode_is_read_only() {
    let Some(driver) = connect().await else { return };
    let Some(restricted) = connect_with(AccessMode::Restricted).await else { return };
    let schema = scratch_schema();
    let schema_ops = SchemaOperations::new(&driver);
    assert!(schema_ops.create_schema(&schema, true).await.success);
    let setup = CatalogOperations::new(&driver)
        .execute_sql(&format!("CREATE TABLE \"{}\".t (id int)", schema))
        .await;
    assert!(setup.success, "{}", setup.message);

    let blocked_ddl = SchemaOperations::new(&restricted)
        .create_schema(&format!("{}_more", schema), true)
        .await;
    assert!(!blocked_ddl.success);
    assert!(blocked_ddl.message.contains("read-only transaction"));

    let catalog = CatalogOperations::new(&restricted);
    let rejected = catalog.execute_sql("SET default_transaction_read_only = off").await;
    assert!(!rejected.success);

    // Passes the keyword gate, stopped by the read-only transaction
    let sneaky = catalog
        .execute_sql(&format!(
            "WITH gone AS (DELETE FROM \"{}\".t RETURNING id) SELECT count(*) FROM gone",
            schema
        ))
        .await;
    assert!(!sneaky.success);
    assert!(sneaky.message.contains("read-only transaction"));

    let read = catalog.execute_sql("SELECT 1 AS one").await;
    assert!(read.success, "{}", read.message);
    assert_eq!(read.data[0]["one"], json!(1));

    assert!(schema_ops.drop_schema(&schema, true, true).await.success);
}
