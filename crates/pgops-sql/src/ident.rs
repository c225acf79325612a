//! Identifier and literal quoting
//!
//! PostgreSQL cannot bind identifiers as parameters, so quoting is the only
//! defense for table, column, schema and index names.

use crate::{BuildError, Result};

/// `name` -> `"name"`, doubling embedded quotes
pub fn quote_ident(name: &str) -> Result<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(BuildError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// `"schema"."name"`
pub fn qualified_name(schema: &str, name: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(name)?))
}

/// Standard-conforming string literal, used only where PostgreSQL has no
/// parameter slot (DEFAULT clauses, index options)
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Comma-separated quoted names; a lone `*` passes through unquoted
pub(crate) fn column_list(columns: &[String]) -> Result<String> {
    let quoted = columns
        .iter()
        .map(|c| if c == "*" { Ok("*".to_string()) } else { quote_ident(c) })
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

/// ` RETURNING ...`, or nothing when no columns were requested
pub(crate) fn returning_clause(columns: &[String]) -> Result<String> {
    if columns.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" RETURNING {}", column_list(columns)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users").unwrap(), "\"users\"");
        assert_eq!(quote_ident("Mixed Case").unwrap(), "\"Mixed Case\"");
        assert_eq!(quote_ident("evil\"; DROP TABLE x; --").unwrap(), "\"evil\"\"; DROP TABLE x; --\"");
    }

    #[test]
    fn test_quote_ident_rejects_empty_and_nul() {
        assert!(quote_ident("").is_err());
        assert!(quote_ident("a\0b").is_err());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("public", "t").unwrap(), "\"public\".\"t\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_returning_clause() {
        assert_eq!(returning_clause(&[]).unwrap(), "");
        assert_eq!(
            returning_clause(&["id".to_string(), "name".to_string()]).unwrap(),
            " RETURNING \"id\", \"name\""
        );
        assert_eq!(returning_clause(&["*".to_string()]).unwrap(), " RETURNING *");
    }
}
