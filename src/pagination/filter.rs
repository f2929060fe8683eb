//! `where__<field>[__<operator>]` parsing into a typed predicate tree.

use super::schema::{Field, ResourceSchema};
use super::value::{FieldKind, Value};
use crate::{
    constants::{KEY_SEPARATOR, WHERE_PREFIX},
    error::{AppError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    Not,
    MoreThan,
    MoreThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    In,
    Like,
    ILike,
    IsNull,
}

impl FilterOperator {
    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw {
            "equals" => FilterOperator::Equals,
            "not" => FilterOperator::Not,
            "more_than" => FilterOperator::MoreThan,
            "more_than_or_equal" => FilterOperator::MoreThanOrEqual,
            "less_than" => FilterOperator::LessThan,
            "less_than_or_equal" => FilterOperator::LessThanOrEqual,
            "between" => FilterOperator::Between,
            "in" => FilterOperator::In,
            "like" => FilterOperator::Like,
            "i_like" => FilterOperator::ILike,
            "is_null" => FilterOperator::IsNull,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: &'static Field,
        op: Comparison,
        value: Value,
    },
    Between {
        field: &'static Field,
        low: Value,
        high: Value,
    },
    In {
        field: &'static Field,
        values: Vec<Value>,
    },
    Like {
        field: &'static Field,
        pattern: String,
        case_insensitive: bool,
    },
    IsNull {
        field: &'static Field,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: &'static Field, op: Comparison, value: Value) -> Self {
        Predicate::Compare { field, op, value }
    }

    /// Joins predicates with AND, collapsing the trivial cases.
    pub fn all(mut parts: Vec<Predicate>) -> Option<Predicate> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Predicate::And(parts)),
        }
    }
}

/// Builds the AND of every `where__*` pair; other keys are skipped.
pub fn parse_where(
    schema: &'static ResourceSchema,
    pairs: &[(String, String)],
) -> Result<Option<Predicate>> {
    let mut parts = Vec::new();
    for (key, raw) in pairs {
        if !key.starts_with(WHERE_PREFIX) {
            continue;
        }
        parts.push(parse_condition(schema, key, raw)?);
    }
    Ok(Predicate::all(parts))
}

fn parse_condition(schema: &'static ResourceSchema, key: &str, raw: &str) -> Result<Predicate> {
    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    let operator = match segments.as_slice() {
        [_, _] => FilterOperator::Equals,
        [_, _, op] => FilterOperator::parse(op)
            .ok_or_else(|| AppError::invalid_query(key, format!("unknown filter operator `{}`", op)))?,
        _ => {
            return Err(AppError::invalid_query(
                key,
                "expected where__<field> or where__<field>__<operator>",
            ))
        }
    };

    let field = schema
        .field(segments[1])
        .ok_or_else(|| AppError::invalid_query(key, format!("unknown filter field `{}`", segments[1])))?;

    let scalar = |text: &str| {
        field.kind.parse(text).ok_or_else(|| {
            AppError::invalid_value(key, raw, format!("expected {:?} value", field.kind))
        })
    };

    let predicate = match operator {
        FilterOperator::Equals => Predicate::compare(field, Comparison::Eq, scalar(raw)?),
        FilterOperator::Not => Predicate::compare(field, Comparison::Ne, scalar(raw)?),
        FilterOperator::MoreThan => Predicate::compare(field, Comparison::Gt, scalar(raw)?),
        FilterOperator::MoreThanOrEqual => Predicate::compare(field, Comparison::Gte, scalar(raw)?),
        FilterOperator::LessThan => Predicate::compare(field, Comparison::Lt, scalar(raw)?),
        FilterOperator::LessThanOrEqual => Predicate::compare(field, Comparison::Lte, scalar(raw)?),
        FilterOperator::Between => {
            let bounds: Vec<&str> = raw.split(',').collect();
            let [low, high] = bounds.as_slice() else {
                return Err(AppError::invalid_value(key, raw, "between expects `low,high`"));
            };
            Predicate::Between {
                field,
                low: scalar(*low)?,
                high: scalar(*high)?,
            }
        }
        FilterOperator::In => {
            let values = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| scalar(s))
                .collect::<Result<Vec<_>>>()?;
            if values.is_empty() {
                return Err(AppError::invalid_value(key, raw, "in expects at least one value"));
            }
            Predicate::In { field, values }
        }
        FilterOperator::Like | FilterOperator::ILike => {
            if field.kind != FieldKind::Text {
                return Err(AppError::invalid_query(key, "pattern filters apply to text fields only"));
            }
            Predicate::Like {
                field,
                pattern: format!("%{}%", raw),
                case_insensitive: operator == FilterOperator::ILike,
            }
        }
        FilterOperator::IsNull => {
            let Some(Value::Boolean(is_null)) = FieldKind::Boolean.parse(raw) else {
                return Err(AppError::invalid_value(key, raw, "is_null expects true or false"));
            };
            Predicate::IsNull {
                field,
                negated: !is_null,
            }
        }
    };

    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::schema::Resource;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn members() -> &'static ResourceSchema {
        Resource::Members.schema()
    }

    #[test]
    fn two_segments_mean_equality() {
        let parsed = parse_where(members(), &pairs(&[("where__name", "Grace")]))
            .expect("valid filter")
            .expect("one predicate");
        match parsed {
            Predicate::Compare { field, op, value } => {
                assert_eq!(field.column, "name");
                assert_eq!(op, Comparison::Eq);
                assert_eq!(value, Value::Text("Grace".into()));
            }
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn three_segments_use_operator_table() {
        let parsed = parse_where(
            members(),
            &pairs(&[("where__id__more_than", "10"), ("where__name__i_like", "kim")]),
        )
        .expect("valid filters")
        .expect("predicates");
        let Predicate::And(parts) = parsed else {
            panic!("expected AND of two predicates");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(
            parts[0],
            Predicate::Compare { op: Comparison::Gt, value: Value::Integer(10), .. }
        ));
        assert!(matches!(
            &parts[1],
            Predicate::Like { pattern, case_insensitive: true, .. } if pattern == "%kim%"
        ));
    }

    #[test]
    fn unknown_operator_names_the_key() {
        let err = parse_where(members(), &pairs(&[("where__name__fuzzy_match", "x")]))
            .expect_err("operator is unknown");
        match err {
            AppError::InvalidQuery { key, .. } => assert_eq!(key, "where__name__fuzzy_match"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn wrong_segment_count_is_rejected() {
        let err = parse_where(members(), &pairs(&[("where__name__i_like__x", "a")]))
            .expect_err("four segments");
        assert!(matches!(err, AppError::InvalidQuery { ref key, .. } if key == "where__name__i_like__x"));
    }

    #[test]
    fn unknown_field_and_bad_value_are_rejected() {
        assert!(parse_where(members(), &pairs(&[("where__password", "x")])).is_err());
        let err = parse_where(members(), &pairs(&[("where__id", "abc")])).expect_err("not an int");
        assert!(matches!(err, AppError::InvalidQuery { value: Some(ref v), .. } if v == "abc"));
    }

    #[test]
    fn between_and_in_split_on_commas() {
        let between = parse_where(members(), &pairs(&[("where__id__between", "3,9")]))
            .expect("valid")
            .expect("predicate");
        assert!(matches!(
            between,
            Predicate::Between { low: Value::Integer(3), high: Value::Integer(9), .. }
        ));
        assert!(parse_where(members(), &pairs(&[("where__id__between", "3")])).is_err());

        let within = parse_where(members(), &pairs(&[("where__id__in", "1,2,3")]))
            .expect("valid")
            .expect("predicate");
        assert!(matches!(within, Predicate::In { ref values, .. } if values.len() == 3));
    }

    #[test]
    fn like_on_non_text_field_is_rejected() {
        assert!(parse_where(members(), &pairs(&[("where__id__like", "1")])).is_err());
    }

    #[test]
    fn non_filter_keys_are_ignored() {
        let parsed = parse_where(members(), &pairs(&[("page", "2"), ("take", "10")])).expect("ok");
        assert!(parsed.is_none());
    }
}
