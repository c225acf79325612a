//! WHERE / HAVING compilation

use pgops_ir::{Arity, Operator, QueryCondition};
use serde_json::Value;

use crate::{quote_ident, BuildError, Params, PlaceholderStyle, Result};

/// Compile conditions into a parenthesis-free boolean expression.
///
/// Each condition after the first is prefixed with the logical operator of
/// the condition *before* it. Values are bound into `params`; an empty list
/// yields an empty fragment and the caller drops the clause.
pub fn compile_conditions(conditions: &[QueryCondition], params: &mut Params) -> Result<String> {
    let mut sql = String::new();

    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(conditions[i - 1].logical_operator.keyword());
            sql.push(' ');
        }
        sql.push_str(&compile_condition(condition, params)?);
    }

    Ok(sql)
}

fn compile_condition(condition: &QueryCondition, params: &mut Params) -> Result<String> {
    let column = quote_ident(&condition.column)?;
    let operator = condition.operator.token();
    // `?` is both a jsonb operator and the anonymous placeholder
    if let Operator::Raw(token) = &condition.operator {
        if params.style() == PlaceholderStyle::Anonymous && token.contains('?') {
            return Err(BuildError::AmbiguousOperator(token.clone()));
        }
    }

    match condition.operator.arity() {
        Arity::None => Ok(format!("{} {}", column, operator)),
        Arity::List => {
            let values = match &condition.value {
                Value::Array(values) => values,
                _ => {
                    return Err(BuildError::ListValueRequired {
                        column: condition.column.clone(),
                        operator: operator.to_string(),
                    })
                }
            };
            // `IN ()` is a syntax error in PostgreSQL
            if values.is_empty() {
                return Err(BuildError::EmptyValueList {
                    column: condition.column.clone(),
                    operator: operator.to_string(),
                });
            }
            let placeholders: Vec<String> = values.iter().map(|v| params.push(v.clone())).collect();
            Ok(format!("{} {} ({})", column, operator, placeholders.join(", ")))
        }
        Arity::Single => {
            let placeholder = params.push(condition.value.clone());
            Ok(format!("{} {} {}", column, operator, placeholder))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgops_ir::LogicalOperator;
    use serde_json::json;

    fn conditions(value: serde_json::Value) -> Vec<QueryCondition> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_and_chain_with_anonymous_placeholders() {
        let conds = conditions(json!([
            {"column": "age", "operator": ">", "value": 25},
            {"column": "active", "operator": "=", "value": true, "logical_operator": "AND"}
        ]));
        let mut params = Params::new(PlaceholderStyle::Anonymous);

        let sql = compile_conditions(&conds, &mut params).unwrap();

        assert_eq!(sql, "\"age\" > ? AND \"active\" = ?");
        assert_eq!(params.into_values(), vec![json!(25), json!(true)]);
    }

    #[test]
    fn test_and_chain_with_numbered_placeholders() {
        let conds = conditions(json!([
            {"column": "age", "operator": ">", "value": 25},
            {"column": "active", "operator": "=", "value": true}
        ]));
        let mut params = Params::new(PlaceholderStyle::Numbered);

        let sql = compile_conditions(&conds, &mut params).unwrap();

        assert_eq!(sql, "\"age\" > $1 AND \"active\" = $2");
    }

    #[test]
    fn test_joiner_comes_from_previous_condition() {
        let conds = vec![
            QueryCondition::eq("a", 1).joined_by(LogicalOperator::Or),
            QueryCondition::eq("b", 2),
            QueryCondition::eq("c", 3).joined_by(LogicalOperator::Or),
        ];
        let mut params = Params::new(PlaceholderStyle::Numbered);

        let sql = compile_conditions(&conds, &mut params).unwrap();

        assert_eq!(sql, "\"a\" = $1 OR \"b\" = $2 AND \"c\" = $3");
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let conds = vec![
            QueryCondition::is_null("deleted_at"),
            QueryCondition::new("email", Operator::IsNotNull, json!("ignored")),
        ];
        let mut params = Params::new(PlaceholderStyle::Numbered);

        let sql = compile_conditions(&conds, &mut params).unwrap();

        assert_eq!(sql, "\"deleted_at\" IS NULL AND \"email\" IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_in_list_expands_placeholders() {
        let conds = vec![
            QueryCondition::in_list("id", [1, 2, 3]),
            QueryCondition::new("status", Operator::NotIn, json!(["x"])),
        ];
        let mut params = Params::new(PlaceholderStyle::Numbered);

        let sql = compile_conditions(&conds, &mut params).unwrap();

        assert_eq!(sql, "\"id\" IN ($1, $2, $3) AND \"status\" NOT IN ($4)");
        assert_eq!(params.into_values(), vec![json!(1), json!(2), json!(3), json!("x")]);
    }

    #[test]
    fn test_parameter_count_matches_arity() {
        let conds = conditions(json!([
            {"column": "a", "operator": "=", "value": 1},
            {"column": "b", "operator": "IN", "value": [1, 2, 3, 4]},
            {"column": "c", "operator": "IS NULL"},
            {"column": "d", "operator": "LIKE", "value": "x%", "logical_operator": "OR"},
            {"column": "e", "operator": "NOT IN", "value": ["p", "q"]},
            {"column": "f", "operator": "IS NOT NULL", "value": 7}
        ]));
        let mut params = Params::new(PlaceholderStyle::Anonymous);

        compile_conditions(&conds, &mut params).unwrap();

        assert_eq!(params.len(), 1 + 4 + 0 + 1 + 2 + 0);
    }

    #[test]
    fn test_in_requires_list() {
        let conds = vec![QueryCondition::new("id", Operator::In, json!(5))];
        let mut params = Params::new(PlaceholderStyle::Numbered);

        let err = compile_conditions(&conds, &mut params).unwrap_err();

        assert_eq!(err.to_string(), "Value for IN on column id must be a list");
    }

    #[test]
    fn test_in_rejects_empty_list() {
        let conds = vec![QueryCondition::in_list("id", Vec::<i64>::new())];
        let mut params = Params::new(PlaceholderStyle::Numbered);

        let err = compile_conditions(&conds, &mut params).unwrap_err();

        assert!(matches!(err, BuildError::EmptyValueList { .. }));
    }

    #[test]
    fn test_empty_conditions() {
        let mut params = Params::new(PlaceholderStyle::Numbered);
        assert_eq!(compile_conditions(&[], &mut params).unwrap(), "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_raw_operator_token() {
        let conds = vec![QueryCondition::new("tags", Operator::Raw("@>".into()), json!("{a}"))];
        let mut params = Params::new(PlaceholderStyle::Numbered);

        assert_eq!(compile_conditions(&conds, &mut params).unwrap(), "\"tags\" @> $1");
    }

    #[test]
    fn test_question_mark_operator_needs_numbered_placeholders() {
        let conds = vec![QueryCondition::new("doc", Operator::Raw("?|".into()), json!(["a", "b"]))];

        let mut anonymous = Params::new(PlaceholderStyle::Anonymous);
        let err = compile_conditions(&conds, &mut anonymous).unwrap_err();
        assert_eq!(err, BuildError::AmbiguousOperator("?|".to_string()));
        assert!(anonymous.is_empty());

        let mut numbered = Params::new(PlaceholderStyle::Numbered);
        assert_eq!(compile_conditions(&conds, &mut numbered).unwrap(), "\"doc\" ?| $1");
    }
}
