//! Index definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{default_schema, ModelError};

/// Access method for CREATE INDEX ... USING
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndexMethod {
    #[default]
    Btree,
    Hash,
    Gin,
    Gist,
    Brin,
    Spgist,
    /// pgvector graph index
    Hnsw,
    /// pgvector inverted-list index
    Ivfflat,
}

impl IndexMethod {
    pub const ALL: [IndexMethod; 8] = [
        IndexMethod::Btree,
        IndexMethod::Hash,
        IndexMethod::Gin,
        IndexMethod::Gist,
        IndexMethod::Brin,
        IndexMethod::Spgist,
        IndexMethod::Hnsw,
        IndexMethod::Ivfflat,
    ];

    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Btree => "btree",
            Self::Hash => "hash",
            Self::Gin => "gin",
            Self::Gist => "gist",
            Self::Brin => "brin",
            Self::Spgist => "spgist",
            Self::Hnsw => "hnsw",
            Self::Ivfflat => "ivfflat",
        }
    }

    /// Only vector methods take WITH (...) tuning options
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Hnsw | Self::Ivfflat)
    }
}

impl fmt::Display for IndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for IndexMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        IndexMethod::ALL
            .iter()
            .copied()
            .find(|m| m.sql_name() == wanted)
            .ok_or_else(|| ModelError::UnknownIndexMethod(s.to_string()))
    }
}

impl TryFrom<String> for IndexMethod {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndexMethod> for String {
    fn from(method: IndexMethod) -> Self {
        method.sql_name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    #[serde(alias = "index_name")]
    pub name: String,
    pub table_name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    pub columns: Vec<String>,
    #[serde(default, alias = "index_type")]
    pub method: IndexMethod,
    #[serde(default)]
    pub unique: bool,
    /// Raw predicate for a partial index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_condition: Option<String>,
    /// Method-specific tuning, e.g. `{"m": 16, "ef_construction": 64}` for hnsw
    #[serde(default, alias = "vector_index_options", skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl IndexDefinition {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        table_name: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            schema: default_schema(),
            columns: columns.into_iter().map(Into::into).collect(),
            method: IndexMethod::default(),
            unique: false,
            partial_condition: None,
            options: Map::new(),
        }
    }

    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    #[must_use]
    pub fn using(mut self, method: IndexMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn partial(mut self, condition: impl Into<String>) -> Self {
        self.partial_condition = Some(condition.into());
        self
    }

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}
