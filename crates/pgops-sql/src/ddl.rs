//! DDL: schemas, tables, indexes, extensions

use pgops_ir::{ColumnDefinition, IndexDefinition, IndexMethod, TableDefinition};
use serde_json::{Map, Value};

use crate::ident::column_list;
use crate::{format_data_type, qualified_name, quote_ident, quote_literal, BuildError, CompiledQuery, Result, SqlBuilder};

/// DEFAULT expressions emitted verbatim rather than as string literals
const SQL_FUNCTION_DEFAULTS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "NOW()",
    "UUID_GENERATE_V4()",
    "GEN_RANDOM_UUID()",
];

impl SqlBuilder {
    pub fn create_schema(&self, schema: &str, if_not_exists: bool) -> Result<CompiledQuery> {
        let guard = if if_not_exists { " IF NOT EXISTS" } else { "" };
        Ok(CompiledQuery::text(format!("CREATE SCHEMA{} {}", guard, quote_ident(schema)?)))
    }

    pub fn drop_schema(&self, schema: &str, if_exists: bool, cascade: bool) -> Result<CompiledQuery> {
        let mut sql = String::from("DROP SCHEMA");
        if if_exists {
            sql.push_str(" IF EXISTS");
        }
        sql.push(' ');
        sql.push_str(&quote_ident(schema)?);
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(CompiledQuery::text(sql))
    }

    pub fn create_table(&self, table: &TableDefinition) -> Result<CompiledQuery> {
        if table.columns.is_empty() {
            return Err(BuildError::NoColumns("CREATE TABLE"));
        }

        let mut parts = table
            .columns
            .iter()
            .map(column_definition)
            .collect::<Result<Vec<_>>>()?;
        parts.extend(table.constraints.iter().cloned());

        Ok(CompiledQuery::text(format!(
            "CREATE TABLE {} ({})",
            qualified_name(&table.schema, &table.name)?,
            parts.join(", ")
        )))
    }

    pub fn drop_table(&self, schema: &str, table: &str, if_exists: bool, cascade: bool) -> Result<CompiledQuery> {
        let mut sql = String::from("DROP TABLE");
        if if_exists {
            sql.push_str(" IF EXISTS");
        }
        sql.push(' ');
        sql.push_str(&qualified_name(schema, table)?);
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(CompiledQuery::text(sql))
    }

    /// Options on a non-vector method are dropped; callers decide whether to warn
    pub fn create_index(&self, index: &IndexDefinition) -> Result<CompiledQuery> {
        if index.columns.is_empty() {
            return Err(BuildError::NoColumns("CREATE INDEX"));
        }

        let no_options = Map::new();
        let options = if index.method.is_vector() {
            &index.options
        } else {
            &no_options
        };

        let sql = index_statement(
            index.unique,
            &index.name,
            &qualified_name(&index.schema, &index.table_name)?,
            index.method,
            &column_list(&index.columns)?,
            index.partial_condition.as_deref(),
            options,
        )?;
        Ok(CompiledQuery::text(sql))
    }

    pub fn drop_index(&self, schema: Option<&str>, index: &str, if_exists: bool, cascade: bool) -> Result<CompiledQuery> {
        let target = match schema {
            Some(schema) => qualified_name(schema, index)?,
            None => quote_ident(index)?,
        };

        let mut sql = String::from("DROP INDEX");
        if if_exists {
            sql.push_str(" IF EXISTS");
        }
        sql.push(' ');
        sql.push_str(&target);
        if cascade {
            sql.push_str(" CASCADE");
        }
        Ok(CompiledQuery::text(sql))
    }

    pub fn create_extension(&self, extension: &str, if_not_exists: bool, schema: Option<&str>) -> Result<CompiledQuery> {
        let mut sql = String::from("CREATE EXTENSION");
        if if_not_exists {
            sql.push_str(" IF NOT EXISTS");
        }
        sql.push(' ');
        sql.push_str(&quote_ident(extension)?);
        if let Some(schema) = schema {
            sql.push_str(" WITH SCHEMA ");
            sql.push_str(&quote_ident(schema)?);
        }
        Ok(CompiledQuery::text(sql))
    }

    pub fn reindex(&self, schema: &str, index: &str) -> Result<CompiledQuery> {
        Ok(CompiledQuery::text(format!("REINDEX INDEX {}", qualified_name(schema, index)?)))
    }
}

/// `CREATE [UNIQUE] INDEX "name" ON <table> USING <method> (<columns>) [WHERE ..] [WITH (..)]`
pub(crate) fn index_statement(
    unique: bool,
    name: &str,
    table: &str,
    method: IndexMethod,
    columns: &str,
    partial_condition: Option<&str>,
    options: &Map<String, Value>,
) -> Result<String> {
    let mut sql = String::from("CREATE");
    if unique {
        sql.push_str(" UNIQUE");
    }
    sql.push_str(&format!(
        " INDEX {} ON {} USING {} ({})",
        quote_ident(name)?,
        table,
        method.sql_name(),
        columns
    ));

    if let Some(condition) = partial_condition {
        sql.push_str(" WHERE ");
        sql.push_str(condition);
    }

    if !options.is_empty() {
        let rendered = options
            .iter()
            .map(|(key, value)| index_option(key, value))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(&format!(" WITH ({})", rendered.join(", ")));
    }

    Ok(sql)
}

/// `key = value`; keys are storage parameter names and cannot be quoted
fn index_option(key: &str, value: &Value) -> Result<String> {
    let mut chars = key.chars();
    let valid_key = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid_key {
        return Err(BuildError::InvalidIndexOption {
            key: key.to_string(),
            reason: "option names must be lowercase identifiers".to_string(),
        });
    }

    let rendered = match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => quote_literal(s),
        _ => {
            return Err(BuildError::InvalidIndexOption {
                key: key.to_string(),
                reason: "value must be a number, boolean or string".to_string(),
            })
        }
    };
    Ok(format!("{} = {}", key, rendered))
}

fn column_definition(column: &ColumnDefinition) -> Result<String> {
    let mut sql = format!("{} {}", quote_ident(&column.name)?, format_data_type(column)?);

    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default_expression(default));
    }
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    }
    // PRIMARY KEY already implies it
    if column.unique && !column.primary_key {
        sql.push_str(" UNIQUE");
    }
    if let Some(check) = &column.check_constraint {
        sql.push_str(&format!(" CHECK ({})", check));
    }

    Ok(sql)
}

fn default_expression(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let upper = s.trim().to_uppercase();
            if SQL_FUNCTION_DEFAULTS.contains(&upper.as_str()) {
                upper
            } else {
                quote_literal(s)
            }
        }
        other => quote_literal(&other.to_string()),
    }
}
