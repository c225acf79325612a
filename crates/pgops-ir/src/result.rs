//! Uniform result envelopes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One returned row, columns in select order
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
}

/// Outcome of a DDL or DML call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    pub operation_type: OperationType,
    /// `schema.name` of the object the operation targeted
    pub table_name: String,
    pub execution_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returned_data: Vec<Row>,
}

impl OperationResult {
    pub fn success(
        operation_type: OperationType,
        table_name: impl Into<String>,
        message: impl Into<String>,
        execution_time_ms: f64,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            operation_type,
            table_name: table_name.into(),
            execution_time_ms,
            affected_rows: None,
            returned_data: Vec::new(),
        }
    }

    pub fn failure(
        operation_type: OperationType,
        table_name: impl Into<String>,
        message: impl Into<String>,
        execution_time_ms: f64,
    ) -> Self {
        Self {
            success: false,
            ..Self::success(operation_type, table_name, message, execution_time_ms)
        }
    }

    #[must_use]
    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = Some(affected_rows);
        self
    }

    #[must_use]
    pub fn with_returned_data(mut self, rows: Vec<Row>) -> Self {
        self.returned_data = rows;
        self
    }
}

/// Outcome of a read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    pub message: String,
    pub data: Vec<Row>,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    pub execution_time_ms: f64,
}

impl QueryResult {
    /// Column names come from the first row; an empty result has none
    pub fn success(data: Vec<Row>, message: impl Into<String>, execution_time_ms: f64) -> Self {
        let columns = data
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let total_count = Some(data.len());

        Self {
            success: true,
            message: message.into(),
            data,
            columns,
            total_count,
            execution_time_ms,
        }
    }

    pub fn failure(message: impl Into<String>, execution_time_ms: f64) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Vec::new(),
            columns: Vec::new(),
            total_count: None,
            execution_time_ms,
        }
    }
}
