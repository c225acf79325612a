//! Column type system for pgops IR

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    // Integers
    Integer,
    Bigint,
    Serial,
    Bigserial,

    // Text
    Text,
    Varchar,
    Char,

    Boolean,

    // Temporal
    Timestamp,
    Timestamptz,
    Date,
    Time,

    // Documents
    Json,
    Jsonb,
    Uuid,

    // pgvector
    Vector,

    // Numeric
    Decimal,
    Numeric,
    Real,
    #[serde(alias = "double precision")]
    DoublePrecision,
}

impl DataType {
    pub const ALL: [DataType; 20] = [
        DataType::Integer,
        DataType::Bigint,
        DataType::Serial,
        DataType::Bigserial,
        DataType::Text,
        DataType::Varchar,
        DataType::Char,
        DataType::Boolean,
        DataType::Timestamp,
        DataType::Timestamptz,
        DataType::Date,
        DataType::Time,
        DataType::Json,
        DataType::Jsonb,
        DataType::Uuid,
        DataType::Vector,
        DataType::Decimal,
        DataType::Numeric,
        DataType::Real,
        DataType::DoublePrecision,
    ];

    /// Name used in requests (`double_precision`, `timestamptz`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Bigint => "bigint",
            Self::Serial => "serial",
            Self::Bigserial => "bigserial",
            Self::Text => "text",
            Self::Varchar => "varchar",
            Self::Char => "char",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Timestamptz => "timestamptz",
            Self::Date => "date",
            Self::Time => "time",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Uuid => "uuid",
            Self::Vector => "vector",
            Self::Decimal => "decimal",
            Self::Numeric => "numeric",
            Self::Real => "real",
            Self::DoublePrecision => "double_precision",
        }
    }

    /// Bare PostgreSQL type keyword, without length/precision/dimension modifiers
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::DoublePrecision => "double precision",
            other => other.name(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == wanted || t.sql_name() == wanted)
            .ok_or_else(|| ModelError::UnknownDataType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("JSONB".parse::<DataType>().unwrap(), DataType::Jsonb);
        assert_eq!(" Vector ".parse::<DataType>().unwrap(), DataType::Vector);
        assert_eq!("double precision".parse::<DataType>().unwrap(), DataType::DoublePrecision);
        assert!("smallint".parse::<DataType>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let t: DataType = serde_json::from_str("\"double_precision\"").unwrap();
        assert_eq!(t, DataType::DoublePrecision);
        let t: DataType = serde_json::from_str("\"double precision\"").unwrap();
        assert_eq!(t, DataType::DoublePrecision);
        assert_eq!(serde_json::to_string(&DataType::Timestamptz).unwrap(), "\"timestamptz\"");
    }

    #[test]
    fn test_every_name_parses_back() {
        for t in DataType::ALL {
            assert_eq!(t.name().parse::<DataType>().unwrap(), t);
        }
    }
}
