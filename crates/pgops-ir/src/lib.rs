//! pgops Intermediate Representation (IR)
//!
//! Language-agnostic descriptions of database operations: table and column
//! schemas, filter predicates, query options, index definitions and vector
//! search parameters, plus the result envelopes handed back to callers.
//! Every value is constructed per call, consumed once and serializable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod catalog;
mod condition;
mod index;
mod result;
mod types;
mod vector;

pub use catalog::*;
pub use condition::*;
pub use index::*;
pub use result::*;
pub use types::*;
pub use vector::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid data type: {0}")]
    UnknownDataType(String),

    #[error("Unsupported operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid logical operator: {0} (expected AND or OR)")]
    InvalidLogicalOperator(String),

    #[error("Invalid sort direction: {0} (expected ASC or DESC)")]
    InvalidSortDirection(String),

    #[error("Unsupported index method: {0}")]
    UnknownIndexMethod(String),

    #[error("Unsupported distance function: {0}")]
    UnsupportedDistanceFunction(String),

    #[error("Vector column {0} must specify vector_dimensions")]
    MissingVectorDimensions(String),

    #[error("Unsupported object type: {0} (expected table, view, sequence or extension)")]
    UnsupportedObjectType(String),
}

pub(crate) fn default_schema() -> String {
    "public".to_string()
}

fn default_true() -> bool {
    true
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColumnSpec")]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// String defaults are quoted unless they name a SQL function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub primary_key: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_constraint: Option<String>,
    /// Required for `vector`, ignored otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_dimensions: Option<u32>,
}

/// Wire shape of a column; validated into [`ColumnDefinition`]
#[derive(Deserialize)]
pub struct ColumnSpec {
    name: String,
    data_type: DataType,
    #[serde(default = "default_true")]
    nullable: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    check_constraint: Option<String>,
    #[serde(default)]
    vector_dimensions: Option<u32>,
}

impl TryFrom<ColumnSpec> for ColumnDefinition {
    type Error = ModelError;

    fn try_from(spec: ColumnSpec) -> Result<Self, Self::Error> {
        let column = Self {
            name: spec.name,
            data_type: spec.data_type,
            nullable: spec.nullable,
            default: spec.default,
            primary_key: spec.primary_key,
            unique: spec.unique,
            check_constraint: spec.check_constraint,
            vector_dimensions: spec.vector_dimensions,
        };
        column.validate()?;
        Ok(column)
    }
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            check_constraint: None,
            vector_dimensions: None,
        }
    }

    pub fn vector(name: impl Into<String>, dimensions: u32) -> Self {
        Self {
            vector_dimensions: Some(dimensions),
            ..Self::new(name, DataType::Vector)
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.check_constraint = Some(expression.into());
        self
    }

    /// A vector column needs a positive dimension count
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.data_type == DataType::Vector && !matches!(self.vector_dimensions, Some(d) if d > 0) {
            return Err(ModelError::MissingVectorDimensions(self.name.clone()));
        }
        Ok(())
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Column order is creation order
    pub columns: Vec<ColumnDefinition>,
    /// Raw table-level constraints, e.g. `UNIQUE ("a", "b")`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    /// Advisory only, not rendered by CREATE TABLE
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Value>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            schema: default_schema(),
            columns,
            constraints: Vec::new(),
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// `schema.name`, as reported in results
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}
