//! Catalog introspection queries
//!
//! `information_schema` reports its columns as domain types, so every column
//! read from it is cast to `text` before it reaches the driver.

use pgops_ir::ObjectType;
use serde_json::json;

use crate::{CompiledQuery, SqlBuilder};

/// First keywords of statements that cannot write
const READ_ONLY_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "SHOW", "EXPLAIN", "VALUES", "TABLE"];

const LIST_SCHEMAS_SQL: &str = "SELECT schema_name::text AS schema_name, \
schema_owner::text AS schema_owner, \
CASE WHEN schema_name LIKE 'pg\\_%' THEN 'System Schema' \
WHEN schema_name = 'information_schema' THEN 'System Information Schema' \
ELSE 'User Schema' END AS schema_type \
FROM information_schema.schemata \
ORDER BY schema_type, schema_name";

const EXTENSION_SQL: &str = "SELECT extname::text AS \"name\", extversion AS \"version\", \
extrelocatable AS relocatable FROM pg_extension";

impl SqlBuilder {
    pub fn list_schemas(&self) -> CompiledQuery {
        CompiledQuery::text(LIST_SCHEMAS_SQL)
    }

    /// Extensions are database-wide, so `schema` only filters the other kinds
    pub fn list_objects(&self, schema: &str, object_type: ObjectType) -> CompiledQuery {
        let mut params = self.params();

        let sql = match object_type.table_type() {
            Some(table_type) => {
                let schema_param = params.push(json!(schema));
                let type_param = params.push(json!(table_type));
                format!(
                    "SELECT table_schema::text AS \"schema\", table_name::text AS \"name\", \
                     table_type::text AS \"type\" FROM information_schema.tables \
                     WHERE table_schema = {} AND table_type = {} ORDER BY table_name",
                    schema_param, type_param
                )
            }
            None if object_type == ObjectType::Sequence => {
                let schema_param = params.push(json!(schema));
                format!(
                    "SELECT sequence_schema::text AS \"schema\", sequence_name::text AS \"name\", \
                     data_type::text AS data_type FROM information_schema.sequences \
                     WHERE sequence_schema = {} ORDER BY sequence_name",
                    schema_param
                )
            }
            None => format!("{} ORDER BY extname", EXTENSION_SQL),
        };

        CompiledQuery {
            sql,
            params: params.into_values(),
        }
    }

    /// Columns of a table or view in ordinal order
    pub fn object_columns(&self, schema: &str, name: &str) -> CompiledQuery {
        let mut params = self.params();
        let schema_param = params.push(json!(schema));
        let name_param = params.push(json!(name));

        CompiledQuery {
            sql: format!(
                "SELECT column_name::text AS \"column\", data_type::text AS data_type, \
                 is_nullable::text AS is_nullable, column_default::text AS \"default\" \
                 FROM information_schema.columns \
                 WHERE table_schema = {} AND table_name = {} ORDER BY ordinal_position",
                schema_param, name_param
            ),
            params: params.into_values(),
        }
    }

    /// One row per constraint and key column; unkeyed constraints have a NULL column
    pub fn object_constraints(&self, schema: &str, name: &str) -> CompiledQuery {
        let mut params = self.params();
        let schema_param = params.push(json!(schema));
        let name_param = params.push(json!(name));

        CompiledQuery {
            sql: format!(
                "SELECT tc.constraint_name::text AS constraint_name, \
                 tc.constraint_type::text AS constraint_type, kcu.column_name::text AS column_name \
                 FROM information_schema.table_constraints AS tc \
                 LEFT JOIN information_schema.key_column_usage AS kcu \
                 ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
                 WHERE tc.table_schema = {} AND tc.table_name = {} \
                 ORDER BY tc.constraint_name, kcu.ordinal_position",
                schema_param, name_param
            ),
            params: params.into_values(),
        }
    }

    pub fn object_indexes(&self, schema: &str, name: &str) -> CompiledQuery {
        let mut params = self.params();
        let schema_param = params.push(json!(schema));
        let name_param = params.push(json!(name));

        CompiledQuery {
            sql: format!(
                "SELECT indexname::text AS \"name\", indexdef AS definition FROM pg_indexes \
                 WHERE schemaname = {} AND tablename = {} ORDER BY indexname",
                schema_param, name_param
            ),
            params: params.into_values(),
        }
    }

    pub fn sequence_details(&self, schema: &str, name: &str) -> CompiledQuery {
        let mut params = self.params();
        let schema_param = params.push(json!(schema));
        let name_param = params.push(json!(name));

        CompiledQuery {
            sql: format!(
                "SELECT sequence_schema::text AS \"schema\", sequence_name::text AS \"name\", \
                 data_type::text AS data_type, start_value::text AS start_value, \
                 increment::text AS increment FROM information_schema.sequences \
                 WHERE sequence_schema = {} AND sequence_name = {}",
                schema_param, name_param
            ),
            params: params.into_values(),
        }
    }

    pub fn extension_details(&self, name: &str) -> CompiledQuery {
        let mut params = self.params();
        let name_param = params.push(json!(name));

        CompiledQuery {
            sql: format!("{} WHERE extname = {}", EXTENSION_SQL, name_param),
            params: params.into_values(),
        }
    }
}

/// Whether `sql` starts with a keyword of a non-writing statement.
///
/// Leading comments and parentheses are skipped. Data-modifying CTEs pass this
/// check, so callers still run the statement in a read-only transaction.
pub fn is_read_only_statement(sql: &str) -> bool {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(comment) = rest.strip_prefix("--") {
            rest = comment.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(comment) = rest.strip_prefix("/*") {
            match comment.split_once("*/") {
                Some((_, after)) => rest = after,
                None => return false,
            }
        } else {
            break;
        }
    }

    let keyword: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    READ_ONLY_KEYWORDS.contains(&keyword.as_str())
}
