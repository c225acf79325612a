//! Compiler - transforms pgops IR into PostgreSQL statements
//!
//! One builder covers DDL, DML and pgvector statements. Identifiers are always
//! quoted, values always travel in the parameter list; nothing a caller sends
//! as data is interpolated into SQL text.

use pgops_ir::{IndexMethod, ModelError};
use serde_json::Value;
use thiserror::Error;

mod catalog;
mod ddl;
mod dml;
mod ident;
mod predicate;
mod types;
mod vector;

pub use catalog::is_read_only_statement;
pub use ident::{qualified_name, quote_ident, quote_literal};
pub use predicate::compile_conditions;
pub use types::format_data_type;
pub use vector::distance_expression;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("No data provided for insert")]
    EmptyInsert,

    #[error("No data provided for update")]
    EmptyUpdate,

    #[error("{0} requires at least one column")]
    NoColumns(&'static str),

    #[error("Value for {operator} on column {column} must be a list")]
    ListValueRequired { column: String, operator: String },

    #[error("Value list for {operator} on column {column} must not be empty")]
    EmptyValueList { column: String, operator: String },

    #[error("Invalid index option {key}: {reason}")]
    InvalidIndexOption { key: String, reason: String },

    #[error("Unsupported vector index method: {0} (expected hnsw or ivfflat)")]
    UnsupportedVectorIndex(IndexMethod),

    #[error("Operator {0} contains '?', which clashes with anonymous placeholders")]
    AmbiguousOperator(String),

    #[error("Search vector must not be empty")]
    EmptyVector,
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// Positional-parameter convention of the driver that will run the SQL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` numbered across the whole statement (PostgreSQL native)
    #[default]
    Numbered,
    /// `?` for every parameter
    Anonymous,
}

/// Parameter accumulator shared by every clause of one statement
#[derive(Debug, Clone)]
pub struct Params {
    style: PlaceholderStyle,
    values: Vec<Value>,
}

impl Params {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            values: Vec::new(),
        }
    }

    /// Bind a value and return the placeholder that refers to it
    pub fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        match self.style {
            PlaceholderStyle::Numbered => format!("${}", self.values.len()),
            PlaceholderStyle::Anonymous => "?".to_string(),
        }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// SQL text plus the values bound to its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    /// Statement without parameters (DDL cannot bind identifiers)
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// One INSERT reused for every record of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub sql: String,
    /// Taken from the first record's keys
    pub columns: Vec<String>,
    /// Parameter vector per record, aligned with `columns`
    pub rows: Vec<Vec<Value>>,
}

pub struct SqlBuilder {
    style: PlaceholderStyle,
}

impl SqlBuilder {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    fn params(&self) -> Params {
        Params::new(self.style)
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new(PlaceholderStyle::default())
    }
}
