//! Catalog object kinds for introspection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Kind of database object listed or described by the catalog operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ObjectType {
    #[default]
    Table,
    View,
    Sequence,
    /// Database-wide; the schema is ignored
    Extension,
}

impl ObjectType {
    pub const ALL: [ObjectType; 4] = [
        ObjectType::Table,
        ObjectType::View,
        ObjectType::Sequence,
        ObjectType::Extension,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::Sequence => "sequence",
            Self::Extension => "extension",
        }
    }

    /// `information_schema.tables.table_type` for relations
    pub fn table_type(&self) -> Option<&'static str> {
        match self {
            Self::Table => Some("BASE TABLE"),
            Self::View => Some("VIEW"),
            Self::Sequence | Self::Extension => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ObjectType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| ModelError::UnsupportedObjectType(s.to_string()))
    }
}

impl TryFrom<String> for ObjectType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectType> for String {
    fn from(object_type: ObjectType) -> Self {
        object_type.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_type_lookup() {
        assert_eq!("TABLE".parse::<ObjectType>().unwrap(), ObjectType::Table);
        assert_eq!(" view ".parse::<ObjectType>().unwrap(), ObjectType::View);
        assert_eq!(ObjectType::Sequence.table_type(), None);
        assert_eq!(ObjectType::View.table_type(), Some("VIEW"));

        let err = "function".parse::<ObjectType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported object type: function (expected table, view, sequence or extension)"
        );
    }

    #[test]
    fn test_object_type_serde() {
        let parsed: ObjectType = serde_json::from_value(json!("extension")).unwrap();
        assert_eq!(parsed, ObjectType::Extension);
        assert_eq!(serde_json::to_value(ObjectType::Table).unwrap(), json!("table"));
        assert!(serde_json::from_value::<ObjectType>(json!("trigger")).is_err());
    }
}
