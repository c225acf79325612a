//! Tool catalogue and dispatch
//!
//! Each tool takes a JSON object of arguments, runs one engine operation and
//! answers with the serialized `OperationResult` or `QueryResult`. Arguments
//! that do not describe a valid call get the same envelope with
//! `success: false`. Dispatch does not know about the transport; see `mcp`
//! for the MCP surface.

use pgops_exec::{CatalogOperations, CrudOperations, SchemaOperations, SqlDriver, VectorOperations};
use pgops_ir::{
    ColumnDefinition, DistanceFunction, IndexDefinition, ObjectType, OperationResult, OperationType, OrderBy,
    QueryCondition, QueryOptions, QueryResult, Row, TableDefinition, VectorIndexSpec, VectorSearchOptions,
    VectorTableSpec,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Arguments for {tool} must be a JSON object, got {found}")]
    NotAnObject { tool: String, found: String },

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Envelope a tool answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Operation(OperationType),
    Query,
}

/// `None` for names that are not tools
pub fn result_kind(tool: &str) -> Option<ResultKind> {
    let kind = match tool {
        "create_table" | "create_schema" | "create_index" | "create_extension" | "create_vector_table"
        | "create_vector_index" => ResultKind::Operation(OperationType::Create),
        "insert_records" | "insert_vector_data" => ResultKind::Operation(OperationType::Insert),
        "update_records" | "optimize_vector_index" => ResultKind::Operation(OperationType::Update),
        "delete_records" => ResultKind::Operation(OperationType::Delete),
        "drop_schema" | "drop_table" | "drop_index" => ResultKind::Operation(OperationType::Drop),
        "query_records" | "vector_similarity_search" | "vector_knn_search" | "get_vector_index_stats"
        | "list_schemas" | "list_objects" | "get_object_details" | "execute_sql" => ResultKind::Query,
        _ => return None,
    };
    Some(kind)
}

/// Name, description and JSON input schema of one tool
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: Vec<&'static str>,
    pub properties: Map<String, Value>,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_vector_column() -> String {
    "embedding".to_string()
}

fn default_true() -> bool {
    true
}

fn default_k() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
struct CreateTableArgs {
    table_name: String,
    columns: Vec<ColumnDefinition>,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default)]
    constraints: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct InsertRecordsArgs {
    table_name: String,
    data: Vec<Row>,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default)]
    returning_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct UpdateRecordsArgs {
    table_name: String,
    data: Row,
    conditions: Vec<QueryCondition>,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default)]
    returning_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct DeleteRecordsArgs {
    table_name: String,
    conditions: Vec<QueryCondition>,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default)]
    returning_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct QueryRecordsArgs {
    table_name: String,
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    conditions: Option<Vec<QueryCondition>>,
    #[serde(default)]
    order_by: Option<Vec<OrderBy>>,
    #[serde(default)]
    group_by: Option<Vec<String>>,
    #[serde(default)]
    having: Option<Vec<QueryCondition>>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default = "default_schema")]
    schema: String,
}

#[derive(Debug, Deserialize)]
struct CreateSchemaArgs {
    schema_name: String,
    #[serde(default = "default_true")]
    if_not_exists: bool,
}

#[derive(Debug, Deserialize)]
struct DropSchemaArgs {
    schema_name: String,
    #[serde(default)]
    cascade: bool,
    #[serde(default = "default_true")]
    if_exists: bool,
}

#[derive(Debug, Deserialize)]
struct DropTableArgs {
    table_name: String,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default)]
    cascade: bool,
    #[serde(default = "default_true")]
    if_exists: bool,
}

#[derive(Debug, Deserialize)]
struct DropIndexArgs {
    index_name: String,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default = "default_true")]
    if_exists: bool,
    #[serde(default)]
    cascade: bool,
}

#[derive(Debug, Deserialize)]
struct CreateExtensionArgs {
    extension_name: String,
    #[serde(default = "default_true")]
    if_not_exists: bool,
    #[serde(default)]
    schema: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InsertVectorDataArgs {
    table_name: String,
    vectors: Vec<Vec<f32>>,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default = "default_vector_column")]
    vector_column: String,
    #[serde(default)]
    additional_data: Option<Vec<Row>>,
    #[serde(default)]
    returning_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SimilaritySearchArgs {
    table_name: String,
    search_vector: Vec<f32>,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default = "default_vector_column")]
    vector_column: String,
    #[serde(default)]
    distance_function: DistanceFunction,
    #[serde(default = "default_k")]
    limit: u64,
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    additional_columns: Option<Vec<String>>,
    #[serde(default = "default_true")]
    include_distance: bool,
}

#[derive(Debug, Deserialize)]
struct KnnSearchArgs {
    table_name: String,
    search_vector: Vec<f32>,
    #[serde(default = "default_k")]
    k: u64,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default = "default_vector_column")]
    vector_column: String,
    #[serde(default)]
    distance_function: DistanceFunction,
    #[serde(default)]
    additional_columns: Option<Vec<String>>,
    #[serde(default = "default_true")]
    include_distance: bool,
}

#[derive(Debug, Deserialize)]
struct IndexStatsArgs {
    table_name: String,
    #[serde(default = "default_schema")]
    schema: String,
    #[serde(default = "default_vector_column")]
    vector_column: String,
}

#[derive(Debug, Deserialize)]
struct OptimizeIndexArgs {
    index_name: String,
    #[serde(default = "default_schema")]
    schema: String,
}

#[derive(Debug, Deserialize)]
struct ListObjectsArgs {
    schema_name: String,
    #[serde(default)]
    object_type: ObjectType,
}

#[derive(Debug, Deserialize)]
struct ObjectDetailsArgs {
    schema_name: String,
    object_name: String,
    #[serde(default)]
    object_type: ObjectType,
}

#[derive(Debug, Deserialize)]
struct ExecuteSqlArgs {
    sql: String,
}

#[derive(Debug, Error)]
enum DispatchError {
    /// A JSON object that does not describe a valid call
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

fn parse<T: DeserializeOwned>(arguments: &Map<String, Value>) -> Result<T, DispatchError> {
    serde_json::from_value(Value::Object(arguments.clone())).map_err(|e| DispatchError::Invalid(e.to_string()))
}

fn to_json<T: Serialize>(result: &T) -> Result<Value, DispatchError> {
    Ok(serde_json::to_value(result)?)
}

/// `schema.table` when the call names a table, otherwise whatever object it names
fn target_name(arguments: &Map<String, Value>) -> String {
    let text = |key: &str| arguments.get(key).and_then(Value::as_str);

    match text("table_name") {
        Some(table) => format!("{}.{}", text("schema").unwrap_or("public"), table),
        None => ["schema_name", "index_name", "extension_name"]
            .into_iter()
            .find_map(text)
            .unwrap_or_default()
            .to_string(),
    }
}

fn invalid_arguments(tool: &str, kind: ResultKind, arguments: &Map<String, Value>, reason: &str) -> Result<Value, ToolError> {
    warn!("Invalid arguments for {}: {}", tool, reason);
    let message = format!("Invalid arguments for {}: {}", tool, reason);

    let value = match kind {
        ResultKind::Operation(operation_type) => {
            serde_json::to_value(OperationResult::failure(operation_type, target_name(arguments), message, 0.0))?
        }
        ResultKind::Query => serde_json::to_value(QueryResult::failure(message, 0.0))?,
    };
    Ok(value)
}

/// Run the named tool against `driver`
///
/// Engine failures and invalid arguments come back as `success: false` inside
/// the returned value; `Err` is reserved for unknown tools and payloads that
/// are not JSON objects.
pub async fn call_tool(driver: &dyn SqlDriver, name: &str, arguments: Value) -> Result<Value, ToolError> {
    info!("Tool called: {}", name);
    debug!("Arguments: {}", arguments);

    let kind = result_kind(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
    // Missing arguments read as an empty object so defaults still apply
    let arguments = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(ToolError::NotAnObject {
                tool: name.to_string(),
                found: other.to_string(),
            })
        }
    };

    match dispatch(driver, name, &arguments).await {
        Ok(value) => Ok(value),
        Err(DispatchError::Invalid(reason)) => invalid_arguments(name, kind, &arguments, &reason),
        Err(DispatchError::Serialize(e)) => Err(ToolError::Serialize(e)),
    }
}

async fn dispatch(driver: &dyn SqlDriver, name: &str, arguments: &Map<String, Value>) -> Result<Value, DispatchError> {
    match name {
        "create_table" => {
            let args: CreateTableArgs = parse(arguments)?;
            let mut table = TableDefinition::new(args.table_name, args.columns).in_schema(args.schema);
            for constraint in args.constraints.unwrap_or_default() {
                table = table.constraint(constraint);
            }
            to_json(&CrudOperations::new(driver).create_table(&table).await)
        }
        "insert_records" => {
            let args: InsertRecordsArgs = parse(arguments)?;
            let result = CrudOperations::new(driver)
                .insert_records(
                    &args.schema,
                    &args.table_name,
                    &args.data,
                    &args.returning_columns.unwrap_or_default(),
                )
                .await;
            to_json(&result)
        }
        "update_records" => {
            let args: UpdateRecordsArgs = parse(arguments)?;
            let result = CrudOperations::new(driver)
                .update_records(
                    &args.schema,
                    &args.table_name,
                    &args.data,
                    &args.conditions,
                    &args.returning_columns.unwrap_or_default(),
                )
                .await;
            to_json(&result)
        }
        "delete_records" => {
            let args: DeleteRecordsArgs = parse(arguments)?;
            let result = CrudOperations::new(driver)
                .delete_records(
                    &args.schema,
                    &args.table_name,
                    &args.conditions,
                    &args.returning_columns.unwrap_or_default(),
                )
                .await;
            to_json(&result)
        }
        "query_records" => {
            let args: QueryRecordsArgs = parse(arguments)?;
            let options = QueryOptions {
                limit: args.limit,
                offset: args.offset,
                order_by: args.order_by.unwrap_or_default(),
                group_by: args.group_by.unwrap_or_default(),
                having: args.having.unwrap_or_default(),
            };
            let result = CrudOperations::new(driver)
                .query_records(
                    &args.schema,
                    &args.table_name,
                    &args.columns.unwrap_or_default(),
                    &args.conditions.unwrap_or_default(),
                    &options,
                )
                .await;
            to_json(&result)
        }
        "create_schema" => {
            let args: CreateSchemaArgs = parse(arguments)?;
            to_json(
                &SchemaOperations::new(driver)
                    .create_schema(&args.schema_name, args.if_not_exists)
                    .await,
            )
        }
        "drop_schema" => {
            let args: DropSchemaArgs = parse(arguments)?;
            to_json(
                &SchemaOperations::new(driver)
                    .drop_schema(&args.schema_name, args.cascade, args.if_exists)
                    .await,
            )
        }
        "drop_table" => {
            let args: DropTableArgs = parse(arguments)?;
            to_json(
                &SchemaOperations::new(driver)
                    .drop_table(&args.schema, &args.table_name, args.cascade, args.if_exists)
                    .await,
            )
        }
        "create_index" => {
            let index: IndexDefinition = parse(arguments)?;
            to_json(&SchemaOperations::new(driver).create_index(&index).await)
        }
        "drop_index" => {
            let args: DropIndexArgs = parse(arguments)?;
            to_json(
                &SchemaOperations::new(driver)
                    .drop_index(&args.index_name, args.schema.as_deref(), args.if_exists, args.cascade)
                    .await,
            )
        }
        "create_extension" => {
            let args: CreateExtensionArgs = parse(arguments)?;
            to_json(
                &SchemaOperations::new(driver)
                    .create_extension(&args.extension_name, args.if_not_exists, args.schema.as_deref())
                    .await,
            )
        }
        "create_vector_table" => {
            let spec: VectorTableSpec = parse(arguments)?;
            to_json(&VectorOperations::new(driver).create_vector_table(&spec).await)
        }
        "insert_vector_data" => {
            let args: InsertVectorDataArgs = parse(arguments)?;
            let result = VectorOperations::new(driver)
                .insert_vector_data(
                    &args.schema,
                    &args.table_name,
                    &args.vector_column,
                    &args.vectors,
                    &args.additional_data.unwrap_or_default(),
                    &args.returning_columns.unwrap_or_default(),
                )
                .await;
            to_json(&result)
        }
        "vector_similarity_search" => {
            let args: SimilaritySearchArgs = parse(arguments)?;
            let mut options = VectorSearchOptions::new(args.search_vector)
                .distance(args.distance_function)
                .limit(args.limit);
            if let Some(threshold) = args.threshold {
                options = options.threshold(threshold);
            }
            if !args.include_distance {
                options = options.without_distance();
            }
            let result = VectorOperations::new(driver)
                .vector_similarity_search(
                    &args.schema,
                    &args.table_name,
                    &args.vector_column,
                    &options,
                    &args.additional_columns.unwrap_or_default(),
                )
                .await;
            to_json(&result)
        }
        "vector_knn_search" => {
            let args: KnnSearchArgs = parse(arguments)?;
            let mut options = VectorSearchOptions::new(args.search_vector)
                .distance(args.distance_function)
                .limit(args.k);
            if !args.include_distance {
                options = options.without_distance();
            }
            let result = VectorOperations::new(driver)
                .vector_knn_search(
                    &args.schema,
                    &args.table_name,
                    &args.vector_column,
                    &options,
                    &args.additional_columns.unwrap_or_default(),
                )
                .await;
            to_json(&result)
        }
        "create_vector_index" => {
            let spec: VectorIndexSpec = parse(arguments)?;
            to_json(&VectorOperations::new(driver).create_vector_index(&spec).await)
        }
        "get_vector_index_stats" => {
            let args: IndexStatsArgs = parse(arguments)?;
            to_json(
                &VectorOperations::new(driver)
                    .get_vector_index_stats(&args.schema, &args.table_name, &args.vector_column)
                    .await,
            )
        }
        "optimize_vector_index" => {
            let args: OptimizeIndexArgs = parse(arguments)?;
            to_json(
                &VectorOperations::new(driver)
                    .optimize_vector_index(&args.schema, &args.index_name)
                    .await,
            )
        }
        "list_schemas" => to_json(&CatalogOperations::new(driver).list_schemas().await),
        "list_objects" => {
            let args: ListObjectsArgs = parse(arguments)?;
            to_json(
                &CatalogOperations::new(driver)
                    .list_objects(&args.schema_name, args.object_type)
                    .await,
            )
        }
        "get_object_details" => {
            let args: ObjectDetailsArgs = parse(arguments)?;
            to_json(
                &CatalogOperations::new(driver)
                    .get_object_details(&args.schema_name, &args.object_name, args.object_type)
                    .await,
            )
        }
        "execute_sql" => {
            let args: ExecuteSqlArgs = parse(arguments)?;
            to_json(&CatalogOperations::new(driver).execute_sql(&args.sql).await)
        }
        _ => Err(DispatchError::Invalid(format!("no handler for {}", name))),
    }
}

fn prop(kind: &str, description: &str) -> Value {
    json!({ "type": kind, "description": description })
}

fn prop_default(kind: &str, description: &str, default: Value) -> Value {
    json!({ "type": kind, "description": description, "default": default })
}

fn properties(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect()
}

const CONDITIONS_DOC: &str = "List of conditions for the WHERE clause. Each is an object with \
     'column', 'operator' (=, !=, <>, <, <=, >, >=, LIKE, ILIKE, IN, NOT IN, IS NULL, IS NOT NULL), \
     'value' and optional 'logical_operator' (AND/OR, joining it to the previous condition)";

const COLUMNS_DOC: &str = "List of column definitions. Each is an object with 'name', 'data_type' \
     (integer, bigint, serial, bigserial, text, varchar, char, boolean, timestamp, timestamptz, date, \
     time, json, jsonb, uuid, vector, decimal, numeric, real, double_precision) and optional \
     'nullable', 'default', 'primary_key', 'unique', 'check_constraint' and 'vector_dimensions' \
     (required for vector)";

fn schema_prop() -> Value {
    prop_default("string", "Schema name", json!("public"))
}

fn vector_column_prop() -> Value {
    prop_default("string", "Name of the vector column", json!("embedding"))
}

fn returning_prop() -> Value {
    prop("array", "Columns to return from the affected records")
}

fn distance_prop() -> Value {
    prop_default(
        "string",
        "Distance function: 'cosine', 'euclidean' or 'inner_product'",
        json!("cosine"),
    )
}

const OBJECT_TYPE_DOC: &str = "Object type: 'table', 'view', 'sequence' or 'extension'";

/// Every tool the server offers, in a stable order
///
/// `read_only` only changes how `execute_sql` describes itself.
pub fn list_tools(read_only: bool) -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "list_schemas",
            description: "List all schemas in the database",
            required: vec![],
            properties: Map::new(),
        },
        ToolSpec {
            name: "list_objects",
            description: "List objects in a schema",
            required: vec!["schema_name"],
            properties: properties(vec![
                ("schema_name", prop("string", "Schema name")),
                ("object_type", prop_default("string", OBJECT_TYPE_DOC, json!("table"))),
            ]),
        },
        ToolSpec {
            name: "get_object_details",
            description: "Show detailed information about a database object",
            required: vec!["schema_name", "object_name"],
            properties: properties(vec![
                ("schema_name", prop("string", "Schema name")),
                ("object_name", prop("string", "Object name")),
                ("object_type", prop_default("string", OBJECT_TYPE_DOC, json!("table"))),
            ]),
        },
        ToolSpec {
            name: "execute_sql",
            description: if read_only {
                "Execute a read-only SQL query"
            } else {
                "Execute any SQL query"
            },
            required: vec!["sql"],
            properties: properties(vec![("sql", prop("string", "SQL to run"))]),
        },
        ToolSpec {
            name: "create_table",
            description: "Create a new table in the database with specified columns and constraints",
            required: vec!["table_name", "columns"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to create")),
                ("columns", prop("array", COLUMNS_DOC)),
                ("schema", schema_prop()),
                ("constraints", prop("array", "Additional table-level constraints")),
            ]),
        },
        ToolSpec {
            name: "insert_records",
            description: "Insert one or more records into a table",
            required: vec!["table_name", "data"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to insert into")),
                ("data", prop("array", "Records to insert, each an object keyed by column name")),
                ("schema", schema_prop()),
                ("returning_columns", returning_prop()),
            ]),
        },
        ToolSpec {
            name: "update_records",
            description: "Update records in a table based on conditions",
            required: vec!["table_name", "data", "conditions"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to update")),
                ("data", prop("object", "Column values to set")),
                ("conditions", prop("array", CONDITIONS_DOC)),
                ("schema", schema_prop()),
                ("returning_columns", returning_prop()),
            ]),
        },
        ToolSpec {
            name: "delete_records",
            description: "Delete records from a table based on conditions",
            required: vec!["table_name", "conditions"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to delete from")),
                ("conditions", prop("array", CONDITIONS_DOC)),
                ("schema", schema_prop()),
                ("returning_columns", returning_prop()),
            ]),
        },
        ToolSpec {
            name: "query_records",
            description: "Query records from a table with filtering, sorting, grouping and pagination",
            required: vec!["table_name"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to query")),
                ("columns", prop("array", "Columns to select (default: all columns)")),
                ("conditions", prop("array", CONDITIONS_DOC)),
                (
                    "order_by",
                    prop("array", "Ordering, each an object with 'column' and optional 'direction' (ASC/DESC)"),
                ),
                ("group_by", prop("array", "Columns to group by")),
                ("having", prop("array", "Conditions applied to groups, same shape as 'conditions'")),
                ("limit", prop("integer", "Maximum number of records to return")),
                ("offset", prop("integer", "Number of records to skip")),
                ("schema", schema_prop()),
            ]),
        },
        ToolSpec {
            name: "create_schema",
            description: "Create a new database schema",
            required: vec!["schema_name"],
            properties: properties(vec![
                ("schema_name", prop("string", "Name of the schema to create")),
                ("if_not_exists", prop_default("boolean", "Use IF NOT EXISTS clause", json!(true))),
            ]),
        },
        ToolSpec {
            name: "drop_schema",
            description: "Drop a database schema",
            required: vec!["schema_name"],
            properties: properties(vec![
                ("schema_name", prop("string", "Name of the schema to drop")),
                ("cascade", prop_default("boolean", "Also drop all dependent objects", json!(false))),
                ("if_exists", prop_default("boolean", "Use IF EXISTS clause", json!(true))),
            ]),
        },
        ToolSpec {
            name: "drop_table",
            description: "Drop a table from the database",
            required: vec!["table_name"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to drop")),
                ("schema", schema_prop()),
                ("cascade", prop_default("boolean", "Also drop all dependent objects", json!(false))),
                ("if_exists", prop_default("boolean", "Use IF EXISTS clause", json!(true))),
            ]),
        },
        ToolSpec {
            name: "create_index",
            description: "Create an index on a table",
            required: vec!["index_name", "table_name", "columns"],
            properties: properties(vec![
                ("index_name", prop("string", "Name of the index to create")),
                ("table_name", prop("string", "Name of the table to index")),
                ("schema", schema_prop()),
                ("columns", prop("array", "Columns to include in the index")),
                (
                    "index_type",
                    prop_default(
                        "string",
                        "Index type: btree, hash, gin, gist, brin, spgist, hnsw (vector), ivfflat (vector)",
                        json!("btree"),
                    ),
                ),
                ("unique", prop_default("boolean", "Create a unique index", json!(false))),
                ("partial_condition", prop("string", "WHERE clause for a partial index")),
                (
                    "vector_index_options",
                    prop("object", "hnsw: m, ef_construction; ivfflat: lists"),
                ),
            ]),
        },
        ToolSpec {
            name: "drop_index",
            description: "Drop an index from the database",
            required: vec!["index_name"],
            properties: properties(vec![
                ("index_name", prop("string", "Name of the index to drop")),
                ("schema", prop("string", "Schema of the index (default: search path)")),
                ("if_exists", prop_default("boolean", "Use IF EXISTS clause", json!(true))),
                ("cascade", prop_default("boolean", "Also drop all dependent objects", json!(false))),
            ]),
        },
        ToolSpec {
            name: "create_extension",
            description: "Create a PostgreSQL extension",
            required: vec!["extension_name"],
            properties: properties(vec![
                (
                    "extension_name",
                    prop("string", "Name of the extension (e.g. 'vector', 'pg_stat_statements')"),
                ),
                ("if_not_exists", prop_default("boolean", "Use IF NOT EXISTS clause", json!(true))),
                ("schema", prop("string", "Schema to install the extension in")),
            ]),
        },
        ToolSpec {
            name: "create_vector_table",
            description: "Create a table for vector storage with a pgvector column",
            required: vec!["table_name"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the vector table to create")),
                ("schema", schema_prop()),
                ("vector_column", vector_column_prop()),
                (
                    "vector_dimensions",
                    prop_default("integer", "Number of dimensions of the vector", json!(1536)),
                ),
                ("additional_columns", prop("array", COLUMNS_DOC)),
            ]),
        },
        ToolSpec {
            name: "insert_vector_data",
            description: "Insert vector data into a vector table",
            required: vec!["table_name", "vectors"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the vector table")),
                ("vectors", prop("array", "Vectors to insert, each a list of numbers")),
                ("schema", schema_prop()),
                ("vector_column", vector_column_prop()),
                (
                    "additional_data",
                    prop("array", "Extra column values per vector, matched by position"),
                ),
                ("returning_columns", returning_prop()),
            ]),
        },
        ToolSpec {
            name: "vector_similarity_search",
            description: "Perform vector similarity search to find similar vectors",
            required: vec!["table_name", "search_vector"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the vector table to search")),
                ("search_vector", prop("array", "Query vector")),
                ("schema", schema_prop()),
                ("vector_column", vector_column_prop()),
                ("distance_function", distance_prop()),
                ("limit", prop_default("integer", "Maximum number of results", json!(10))),
                ("threshold", prop("number", "Keep only results with a distance below this value")),
                ("additional_columns", prop("array", "Additional columns to include in results")),
                ("include_distance", prop_default("boolean", "Include distance in results", json!(true))),
            ]),
        },
        ToolSpec {
            name: "vector_knn_search",
            description: "Perform K-nearest neighbor vector search to find the k most similar vectors",
            required: vec!["table_name", "search_vector"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the vector table to search")),
                ("search_vector", prop("array", "Query vector")),
                ("k", prop_default("integer", "Number of nearest neighbors to return", json!(10))),
                ("schema", schema_prop()),
                ("vector_column", vector_column_prop()),
                ("distance_function", distance_prop()),
                ("additional_columns", prop("array", "Additional columns to include in results")),
                ("include_distance", prop_default("boolean", "Include distance in results", json!(true))),
            ]),
        },
        ToolSpec {
            name: "create_vector_index",
            description: "Create a vector index for efficient similarity search",
            required: vec!["table_name"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table to index")),
                ("schema", schema_prop()),
                ("vector_column", vector_column_prop()),
                ("index_name", prop("string", "Custom index name (generated when absent)")),
                (
                    "index_type",
                    prop_default("string", "Vector index type: 'hnsw' or 'ivfflat'", json!("hnsw")),
                ),
                (
                    "index_options",
                    prop("object", "hnsw: m (16), ef_construction (64); ivfflat: lists (100)"),
                ),
                ("distance_function", prop("string", "Adds the operator class for this distance")),
            ]),
        },
        ToolSpec {
            name: "get_vector_index_stats",
            description: "Get statistics for the vector indexes of a table",
            required: vec!["table_name"],
            properties: properties(vec![
                ("table_name", prop("string", "Name of the table containing vector indexes")),
                ("schema", schema_prop()),
                ("vector_column", vector_column_prop()),
            ]),
        },
        ToolSpec {
            name: "optimize_vector_index",
            description: "Optimize a vector index by rebuilding it",
            required: vec!["index_name"],
            properties: properties(vec![
                ("index_name", prop("string", "Name of the vector index to optimize")),
                ("schema", schema_prop()),
            ]),
        },
    ]
}
