//! DML: INSERT, UPDATE, DELETE, SELECT

use pgops_ir::{QueryCondition, QueryOptions, Row};
use serde_json::Value;

use crate::ident::{column_list, returning_clause};
use crate::{compile_conditions, qualified_name, quote_ident, BuildError, CompiledQuery, InsertStatement, Result, SqlBuilder};

impl SqlBuilder {
    /// One statement for the whole batch, keyed on the first record's columns
    pub fn insert(&self, schema: &str, table: &str, records: &[Row], returning: &[String]) -> Result<InsertStatement> {
        let first = records.first().ok_or(BuildError::EmptyInsert)?;
        if first.is_empty() {
            return Err(BuildError::EmptyInsert);
        }
        let columns: Vec<String> = first.keys().cloned().collect();

        let mut params = self.params();
        let placeholders: Vec<String> = columns.iter().map(|_| params.push(Value::Null)).collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            qualified_name(schema, table)?,
            column_list(&columns)?,
            placeholders.join(", "),
            returning_clause(returning)?
        );

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(InsertStatement { sql, columns, rows })
    }

    pub fn update(
        &self,
        schema: &str,
        table: &str,
        data: &Row,
        conditions: &[QueryCondition],
        returning: &[String],
    ) -> Result<CompiledQuery> {
        if data.is_empty() {
            return Err(BuildError::EmptyUpdate);
        }

        let mut params = self.params();
        let assignments = data
            .iter()
            .map(|(column, value)| Ok(format!("{} = {}", quote_ident(column)?, params.push(value.clone()))))
            .collect::<Result<Vec<_>>>()?;

        let mut sql = format!("UPDATE {} SET {}", qualified_name(schema, table)?, assignments.join(", "));
        let filter = compile_conditions(conditions, &mut params)?;
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        sql.push_str(&returning_clause(returning)?);

        Ok(CompiledQuery {
            sql,
            params: params.into_values(),
        })
    }

    pub fn delete(
        &self,
        schema: &str,
        table: &str,
        conditions: &[QueryCondition],
        returning: &[String],
    ) -> Result<CompiledQuery> {
        let mut params = self.params();
        let mut sql = format!("DELETE FROM {}", qualified_name(schema, table)?);
        let filter = compile_conditions(conditions, &mut params)?;
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        sql.push_str(&returning_clause(returning)?);

        Ok(CompiledQuery {
            sql,
            params: params.into_values(),
        })
    }

    /// Empty `columns` selects `*`
    pub fn select(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        conditions: &[QueryCondition],
        options: &QueryOptions,
    ) -> Result<CompiledQuery> {
        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            column_list(columns)?
        };

        let mut params = self.params();
        let mut sql = format!("SELECT {} FROM {}", projection, qualified_name(schema, table)?);

        let filter = compile_conditions(conditions, &mut params)?;
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }

        if !options.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&column_list(&options.group_by)?);
        }

        // Without GROUP BY the whole result is one group
        let having = compile_conditions(&options.having, &mut params)?;
        if !having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having);
        }

        if !options.order_by.is_empty() {
            let order = options
                .order_by
                .iter()
                .map(|o| Ok(format!("{} {}", quote_ident(&o.column)?, o.direction.keyword())))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&params.push(Value::from(limit)));
        }
        if let Some(offset) = options.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&params.push(Value::from(offset)));
        }

        Ok(CompiledQuery {
            sql,
            params: params.into_values(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaceholderStyle;
    use pgops_ir::{Operator, SortDirection};
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_with_returning() {
        let records = vec![row(json!({"name": "a"})), row(json!({"name": "b"}))];

        let insert = SqlBuilder::default()
            .insert("public", "t", &records, &strings(&["id", "name"]))
            .unwrap();

        assert_eq!(
            insert.sql,
            "INSERT INTO \"public\".\"t\" (\"name\") VALUES ($1) RETURNING \"id\", \"name\""
        );
        assert_eq!(insert.columns, vec!["name"]);
        assert_eq!(insert.rows, vec![vec![json!("a")], vec![json!("b")]]);
    }

    #[test]
    fn test_insert_binds_missing_keys_as_null() {
        let records = vec![
            row(json!({"name": "a", "age": 3})),
            row(json!({"age": 4})),
            row(json!({"name": "c", "age": 5, "extra": true})),
        ];

        let insert = SqlBuilder::new(PlaceholderStyle::Anonymous)
            .insert("app", "people", &records, &[])
            .unwrap();

        assert_eq!(insert.sql, "INSERT INTO \"app\".\"people\" (\"name\", \"age\") VALUES (?, ?)");
        assert_eq!(
            insert.rows,
            vec![
                vec![json!("a"), json!(3)],
                vec![Value::Null, json!(4)],
                vec![json!("c"), json!(5)],
            ]
        );
    }

    #[test]
    fn test_insert_rejects_empty_payload() {
        let b = SqlBuilder::default();
        assert_eq!(b.insert("public", "t", &[], &[]).unwrap_err(), BuildError::EmptyInsert);
        assert_eq!(
            b.insert("public", "t", &[Row::new()], &[]).unwrap_err().to_string(),
            "No data provided for insert"
        );
    }

    #[test]
    fn test_update_numbers_set_before_where() {
        let query = SqlBuilder::default()
            .update(
                "public",
                "t",
                &row(json!({"name": "z"})),
                &[QueryCondition::eq("id", 1)],
                &strings(&["id", "name"]),
            )
            .unwrap();

        assert_eq!(
            query.sql,
            "UPDATE \"public\".\"t\" SET \"name\" = $1 WHERE \"id\" = $2 RETURNING \"id\", \"name\""
        );
        assert_eq!(query.params, vec![json!("z"), json!(1)]);
    }

    #[test]
    fn test_update_requires_data() {
        let err = SqlBuilder::default()
            .update("public", "t", &Row::new(), &[], &[])
            .unwrap_err();
        assert_eq!(err, BuildError::EmptyUpdate);
    }

    #[test]
    fn test_delete_with_in_list() {
        let query = SqlBuilder::default()
            .delete("public", "t", &[QueryCondition::in_list("id", [1, 2])], &strings(&["*"]))
            .unwrap();

        assert_eq!(query.sql, "DELETE FROM \"public\".\"t\" WHERE \"id\" IN ($1, $2) RETURNING *");
        assert_eq!(query.params, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_delete_rejects_empty_in_list() {
        let conditions = vec![QueryCondition::new("id", Operator::In, json!([]))];

        let err = SqlBuilder::default().delete("public", "t", &conditions, &[]).unwrap_err();

        assert!(matches!(err, BuildError::EmptyValueList { .. }));
    }

    #[test]
    fn test_select_scenario_d_anonymous() {
        let conditions: Vec<QueryCondition> = serde_json::from_value(json!([
            {"column": "age", "operator": ">", "value": 25},
            {"column": "active", "operator": "=", "value": true, "logical_operator": "AND"}
        ]))
        .unwrap();

        let query = SqlBuilder::new(PlaceholderStyle::Anonymous)
            .select("public", "users", &[], &conditions, &QueryOptions::new())
            .unwrap();

        assert_eq!(query.sql, "SELECT * FROM \"public\".\"users\" WHERE \"age\" > ? AND \"active\" = ?");
        assert_eq!(query.params, vec![json!(25), json!(true)]);
    }

    #[test]
    fn test_select_full_clause_order() {
        let options = QueryOptions::new()
            .group_by(["dept"])
            .having(QueryCondition::new("dept", Operator::NotEq, json!("ops")))
            .order_by("dept", SortDirection::Desc)
            .order_by("n", SortDirection::Asc)
            .limit(5)
            .offset(10);

        let query = SqlBuilder::default()
            .select(
                "hr",
                "staff",
                &strings(&["dept", "n"]),
                &[QueryCondition::eq("active", true)],
                &options,
            )
            .unwrap();

        assert_eq!(
            query.sql,
            "SELECT \"dept\", \"n\" FROM \"hr\".\"staff\" WHERE \"active\" = $1 GROUP BY \"dept\" HAVING \"dept\" != $2 ORDER BY \"dept\" DESC, \"n\" ASC LIMIT $3 OFFSET $4"
        );
        assert_eq!(query.params, vec![json!(true), json!("ops"), json!(5), json!(10)]);
    }

    #[test]
    fn test_select_having_without_group_by() {
        let options = QueryOptions::new()
            .having(QueryCondition::new("n", Operator::Gt, json!(5)));

        let query = SqlBuilder::default()
            .select("public", "t", &[], &[], &options)
            .unwrap();

        assert_eq!(query.sql, "SELECT * FROM \"public\".\"t\" HAVING \"n\" > $1");
        assert_eq!(query.params, vec![json!(5)]);
    }

    #[test]
    fn test_select_limit_zero_is_kept() {
        let query = SqlBuilder::default()
            .select("public", "t", &[], &[], &QueryOptions::new().limit(0))
            .unwrap();

        assert_eq!(query.sql, "SELECT * FROM \"public\".\"t\" LIMIT $1");
        assert_eq!(query.params, vec![json!(0)]);
    }
}
