//! pgvector statements: distance search, vector tables, vector indexes

use pgops_ir::{vector_literal, DistanceFunction, IndexMethod, Row, VectorIndexSpec, VectorSearchOptions, VectorTableSpec};
use serde_json::{json, Map, Value};

use crate::ddl::index_statement;
use crate::ident::column_list;
use crate::{qualified_name, quote_ident, BuildError, CompiledQuery, InsertStatement, Params, Result, SqlBuilder};

const INDEX_STATS_SQL: &str = "SELECT i.schemaname, i.tablename, i.indexname, i.indexdef, \
pg_size_pretty(pg_relation_size(c.oid)) AS index_size, am.amname AS index_method, \
s.n_tup_ins AS table_inserts, s.n_tup_upd AS table_updates, s.n_tup_del AS table_deletes \
FROM pg_indexes i \
JOIN pg_namespace n ON n.nspname = i.schemaname \
JOIN pg_class c ON c.relname = i.indexname AND c.relnamespace = n.oid \
JOIN pg_am am ON am.oid = c.relam \
LEFT JOIN pg_stat_user_tables s ON s.schemaname = i.schemaname AND s.relname = i.tablename";

/// `"col" <op> $n::vector`; binds a fresh copy of the vector on every call
pub fn distance_expression(
    column: &str,
    vector: &[f32],
    function: DistanceFunction,
    params: &mut Params,
) -> Result<String> {
    if vector.is_empty() {
        return Err(BuildError::EmptyVector);
    }
    let placeholder = params.push(Value::String(vector_literal(vector)));
    Ok(format!("{} {} {}::vector", quote_ident(column)?, function.operator(), placeholder))
}

fn default_index_options(method: IndexMethod) -> Map<String, Value> {
    let mut options = Map::new();
    match method {
        IndexMethod::Hnsw => {
            options.insert("m".to_string(), json!(16));
            options.insert("ef_construction".to_string(), json!(64));
        }
        IndexMethod::Ivfflat => {
            options.insert("lists".to_string(), json!(100));
        }
        _ => {}
    }
    options
}

impl SqlBuilder {
    /// Nearest rows first, optionally cut off at `threshold`
    pub fn similarity_search(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        options: &VectorSearchOptions,
        additional_columns: &[String],
    ) -> Result<CompiledQuery> {
        self.nearest(schema, table, vector_column, options, options.threshold, additional_columns)
    }

    /// Exact k-nearest-neighbour search; `options.limit` is k and any threshold is ignored
    pub fn knn_search(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        options: &VectorSearchOptions,
        additional_columns: &[String],
    ) -> Result<CompiledQuery> {
        self.nearest(schema, table, vector_column, options, None, additional_columns)
    }

    fn nearest(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        options: &VectorSearchOptions,
        threshold: Option<f64>,
        additional_columns: &[String],
    ) -> Result<CompiledQuery> {
        let mut params = self.params();
        let function = options.distance_function;

        let mut projection = vec![quote_ident("id")?];
        if !additional_columns.is_empty() {
            projection.push(column_list(additional_columns)?);
        }
        if options.include_distance {
            let distance = distance_expression(vector_column, &options.vector, function, &mut params)?;
            projection.push(format!("{} AS distance", distance));
        }

        let mut sql = format!("SELECT {} FROM {}", projection.join(", "), qualified_name(schema, table)?);

        if let Some(threshold) = threshold {
            let distance = distance_expression(vector_column, &options.vector, function, &mut params)?;
            sql.push_str(&format!(" WHERE {} < {}", distance, params.push(json!(threshold))));
        }

        let distance = distance_expression(vector_column, &options.vector, function, &mut params)?;
        sql.push_str(&format!(" ORDER BY {}", distance));
        sql.push_str(&format!(" LIMIT {}", params.push(json!(options.limit))));

        Ok(CompiledQuery {
            sql,
            params: params.into_values(),
        })
    }

    pub fn create_vector_table(&self, spec: &VectorTableSpec) -> Result<CompiledQuery> {
        self.create_table(&spec.to_table_definition())
    }

    /// Caller options override the method defaults, keeping default key order
    pub fn create_vector_index(&self, spec: &VectorIndexSpec) -> Result<CompiledQuery> {
        if !spec.method.is_vector() {
            return Err(BuildError::UnsupportedVectorIndex(spec.method));
        }

        let mut options = default_index_options(spec.method);
        for (key, value) in &spec.options {
            options.insert(key.clone(), value.clone());
        }

        let mut column = quote_ident(&spec.vector_column)?;
        if let Some(function) = spec.distance_function {
            column.push(' ');
            column.push_str(function.ops_class());
        }

        let sql = index_statement(
            false,
            &spec.resolved_name(),
            &qualified_name(&spec.schema, &spec.table_name)?,
            spec.method,
            &column,
            None,
            &options,
        )?;
        Ok(CompiledQuery::text(sql))
    }

    /// The vector column comes first. Extra data beyond the vector count is
    /// ignored; arrays and objects are sent as JSON text.
    pub fn insert_vectors(
        &self,
        schema: &str,
        table: &str,
        vector_column: &str,
        vectors: &[Vec<f32>],
        additional_data: &[Row],
        returning: &[String],
    ) -> Result<InsertStatement> {
        if vectors.is_empty() {
            return Err(BuildError::EmptyInsert);
        }

        let records: Vec<Row> = vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| {
                let mut record = Row::new();
                record.insert(vector_column.to_string(), Value::String(vector_literal(vector)));
                if let Some(extra) = additional_data.get(i) {
                    for (key, value) in extra {
                        if key == vector_column {
                            continue;
                        }
                        let value = match value {
                            Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
                            other => other.clone(),
                        };
                        record.insert(key.clone(), value);
                    }
                }
                record
            })
            .collect();

        self.insert(schema, table, &records, returning)
    }

    /// Indexes on `table` whose definition mentions `vector_column`
    pub fn index_stats(&self, schema: &str, table: &str, vector_column: &str) -> CompiledQuery {
        let mut params = self.params();
        let schema_param = params.push(json!(schema));
        let table_param = params.push(json!(table));
        let pattern_param = params.push(json!(format!("%{}%", escape_like(vector_column))));

        let sql = format!(
            "{} WHERE i.schemaname = {} AND i.tablename = {} AND i.indexdef LIKE {}",
            INDEX_STATS_SQL, schema_param, table_param, pattern_param
        );
        CompiledQuery {
            sql,
            params: params.into_values(),
        }
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
