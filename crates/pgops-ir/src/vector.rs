//! pgvector search parameters

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{default_schema, ColumnDefinition, DataType, IndexMethod, ModelError, TableDefinition};

/// Distance metric for vector similarity search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceFunction {
    /// Cosine distance
    #[default]
    Cosine,
    /// L2 distance
    Euclidean,
    /// Negative inner product
    InnerProduct,
}

impl DistanceFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::InnerProduct => "inner_product",
        }
    }

    /// pgvector operator; smaller is closer for all three
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Cosine => "<=>",
            Self::Euclidean => "<->",
            Self::InnerProduct => "<#>",
        }
    }

    /// pgvector operator class for index creation
    pub fn ops_class(&self) -> &'static str {
        match self {
            Self::Cosine => "vector_cosine_ops",
            Self::Euclidean => "vector_l2_ops",
            Self::InnerProduct => "vector_ip_ops",
        }
    }
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceFunction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "inner_product" => Ok(Self::InnerProduct),
            _ => Err(ModelError::UnsupportedDistanceFunction(s.to_string())),
        }
    }
}

impl TryFrom<String> for DistanceFunction {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DistanceFunction> for String {
    fn from(function: DistanceFunction) -> Self {
        function.name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchOptions {
    pub vector: Vec<f32>,
    #[serde(default)]
    pub distance_function: DistanceFunction,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Keep only rows whose distance is strictly below this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default = "default_include_distance")]
    pub include_distance: bool,
}

fn default_limit() -> u64 {
    10
}

fn default_include_distance() -> bool {
    true
}

impl VectorSearchOptions {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            distance_function: DistanceFunction::default(),
            limit: default_limit(),
            threshold: None,
            include_distance: default_include_distance(),
        }
    }

    #[must_use]
    pub fn distance(mut self, function: DistanceFunction) -> Self {
        self.distance_function = function;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn without_distance(mut self) -> Self {
        self.include_distance = false;
        self
    }
}

fn default_vector_column() -> String {
    "embedding".to_string()
}

fn default_dimensions() -> u32 {
    1536
}

fn default_vector_method() -> IndexMethod {
    IndexMethod::Hnsw
}

/// Table with a serial id, one vector column and a `created_at` audit column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorTableSpec {
    pub table_name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_vector_column")]
    pub vector_column: String,
    #[serde(default = "default_dimensions")]
    pub vector_dimensions: u32,
    /// Appended after the generated columns
    #[serde(default)]
    pub additional_columns: Vec<ColumnDefinition>,
}

impl VectorTableSpec {
    pub fn new(table_name: impl Into<String>, vector_dimensions: u32) -> Self {
        Self {
            table_name: table_name.into(),
            schema: default_schema(),
            vector_column: default_vector_column(),
            vector_dimensions,
            additional_columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    #[must_use]
    pub fn vector_column(mut self, column: impl Into<String>) -> Self {
        self.vector_column = column.into();
        self
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.additional_columns.push(column);
        self
    }

    pub fn to_table_definition(&self) -> TableDefinition {
        let mut columns = vec![
            ColumnDefinition::new("id", DataType::Serial).primary_key().not_null(),
            ColumnDefinition::vector(self.vector_column.clone(), self.vector_dimensions),
            ColumnDefinition::new("created_at", DataType::Timestamp)
                .not_null()
                .default_value("CURRENT_TIMESTAMP"),
        ];
        columns.extend(self.additional_columns.iter().cloned());
        TableDefinition::new(self.table_name.clone(), columns).in_schema(self.schema.clone())
    }
}

/// Vector index request; only hnsw and ivfflat are accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndexSpec {
    pub table_name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_vector_column")]
    pub vector_column: String,
    /// Generated as `idx_<table>_<column>_<method>` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default = "default_vector_method", alias = "index_type")]
    pub method: IndexMethod,
    /// Merged over the method defaults
    #[serde(default, alias = "index_options", skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    /// Adds the matching operator class to the indexed column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_function: Option<DistanceFunction>,
}

impl VectorIndexSpec {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: default_schema(),
            vector_column: default_vector_column(),
            index_name: None,
            method: default_vector_method(),
            options: Map::new(),
            distance_function: None,
        }
    }

    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    #[must_use]
    pub fn vector_column(mut self, column: impl Into<String>) -> Self {
        self.vector_column = column.into();
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn using(mut self, method: IndexMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn distance(mut self, function: DistanceFunction) -> Self {
        self.distance_function = Some(function);
        self
    }

    pub fn resolved_name(&self) -> String {
        match &self.index_name {
            Some(name) => name.clone(),
            None => format!("idx_{}_{}_{}", self.table_name, self.vector_column, self.method),
        }
    }
}

/// pgvector text form: `[1,0.5,-2]`
pub fn vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_table() {
        assert_eq!(DistanceFunction::Cosine.operator(), "<=>");
        assert_eq!(DistanceFunction::Euclidean.operator(), "<->");
        assert_eq!(DistanceFunction::InnerProduct.operator(), "<#>");
        assert_eq!(DistanceFunction::Euclidean.ops_class(), "vector_l2_ops");
    }

    #[test]
    fn test_unknown_distance_function() {
        let err = "manhattan".parse::<DistanceFunction>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported distance function: manhattan");
    }

    #[test]
    fn test_literal() {
        assert_eq!(vector_literal(&[0.0, 1.0, 0.5]), "[0,1,0.5]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_search_options_defaults() {
        let options: VectorSearchOptions = serde_json::from_value(json!({"vector": [0.1, 0.2]})).unwrap();
        assert_eq!(options.distance_function, DistanceFunction::Cosine);
        assert_eq!(options.limit, 10);
        assert!(options.include_distance);
        assert!(options.threshold.is_none());
    }

    #[test]
    fn test_vector_table_columns() {
        let spec: VectorTableSpec = serde_json::from_value(json!({
            "table_name": "docs",
            "vector_dimensions": 3,
            "additional_columns": [{"name": "title", "data_type": "text"}]
        }))
        .unwrap();
        let table = spec.to_table_definition();

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "embedding", "created_at", "title"]);
        assert_eq!(table.schema, "public");
        assert!(table.columns[0].primary_key);
        assert_eq!(table.columns[1].vector_dimensions, Some(3));
        assert_eq!(VectorTableSpec::new("t", 8).vector_dimensions, 8);
    }

    #[test]
    fn test_vector_index_name() {
        let spec = VectorIndexSpec::new("docs");
        assert_eq!(spec.method, IndexMethod::Hnsw);
        assert_eq!(spec.resolved_name(), "idx_docs_embedding_hnsw");

        let spec: VectorIndexSpec = serde_json::from_value(json!({
            "table_name": "docs",
            "vector_column": "vec",
            "index_type": "ivfflat",
            "index_options": {"lists": 50}
        }))
        .unwrap();
        assert_eq!(spec.resolved_name(), "idx_docs_vec_ivfflat");
        assert_eq!(spec.options.get("lists"), Some(&json!(50)));

        assert_eq!(VectorIndexSpec::new("docs").named("custom").resolved_name(), "custom");
    }
}
