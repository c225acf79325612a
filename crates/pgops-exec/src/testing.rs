//! Recording driver for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pgops_ir::Row;
use pgops_sql::PlaceholderStyle;
use serde_json::Value;

use crate::{DriverError, QueryOutput, SqlDriver};

pub struct RecordingDriver {
    style: PlaceholderStyle,
    read_only: bool,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    responses: Mutex<VecDeque<Result<QueryOutput, DriverError>>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::with_style(PlaceholderStyle::Numbered)
    }

    pub fn with_style(style: PlaceholderStyle) -> Self {
        Self {
            style,
            read_only: false,
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn restricted() -> Self {
        Self {
            read_only: true,
            ..Self::new()
        }
    }

    /// Queue the next result; an empty queue answers with no rows
    pub fn respond(&self, response: Result<QueryOutput, DriverError>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn respond_rows(&self, rows: Vec<Value>) -> &Self {
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("row must be an object, got {}", other),
            })
            .collect();
        self.respond(Ok(QueryOutput::from_rows(rows)))
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.respond(Err(DriverError::new(message)))
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|(sql, _)| sql).collect()
    }
}

#[async_trait]
impl SqlDriver for RecordingDriver {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DriverError> {
        self.calls.lock().unwrap().push((sql.to_string(), params.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryOutput::default()))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}
