//! Renders [`QueryOptions`] as PostgreSQL with bound parameters.
//!
//! Identifiers only ever come from the static resource schemas; every value
//! coming from a request is bound.

use sqlx::{Postgres, QueryBuilder};

use crate::models::TenantScope;
use crate::pagination::{Predicate, QueryOptions, ResourceSchema, Value};

fn quoted(ident: &str) -> String {
    format!("\"{}\"", ident)
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Integer(v) => qb.push_bind(*v),
        Value::Text(v) => qb.push_bind(v.clone()),
        Value::Boolean(v) => qb.push_bind(*v),
        Value::Timestamp(v) => qb.push_bind(*v),
    };
}

pub fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Compare { field, op, value } => {
            qb.push(quoted(field.column))
                .push(" ")
                .push(op.as_sql())
                .push(" ");
            push_value(qb, value);
        }
        Predicate::Between { field, low, high } => {
            qb.push(quoted(field.column)).push(" BETWEEN ");
            push_value(qb, low);
            qb.push(" AND ");
            push_value(qb, high);
        }
        Predicate::In { field, values } => {
            qb.push(quoted(field.column)).push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, value);
            }
            qb.push(")");
        }
        Predicate::Like {
            field,
            pattern,
            case_insensitive,
        } => {
            let op = if *case_insensitive { " ILIKE " } else { " LIKE " };
            qb.push(quoted(field.column)).push(op);
            qb.push_bind(pattern.clone());
        }
        Predicate::IsNull { field, negated } => {
            let op = if *negated { " IS NOT NULL" } else { " IS NULL" };
            qb.push(quoted(field.column)).push(op);
        }
        Predicate::And(parts) => push_group(qb, parts, " AND ", "TRUE"),
        Predicate::Or(parts) => push_group(qb, parts, " OR ", "FALSE"),
    }
}

fn push_group(qb: &mut QueryBuilder<'_, Postgres>, parts: &[Predicate], joiner: &str, empty: &str) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(joiner);
        }
        push_predicate(qb, part);
    }
    qb.push(")");
}

fn push_scope<'a>(
    qb: &mut QueryBuilder<'a, Postgres>,
    scope: TenantScope,
    filter: Option<&Predicate>,
) {
    qb.push(" WHERE \"tenant_id\" = ").push_bind(scope.tenant_id);
    if let Some(filter) = filter {
        qb.push(" AND ");
        push_predicate(qb, filter);
    }
}

pub fn select_query<'a>(
    schema: &ResourceSchema,
    scope: TenantScope,
    options: &QueryOptions,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", quoted(schema.table)));
    push_scope(&mut qb, scope, options.filter.as_ref());

    if !options.order.is_empty() {
        qb.push(" ORDER BY ");
        for (i, order) in options.order.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(quoted(order.field.column))
                .push(" ")
                .push(order.direction.as_sql());
        }
    }

    qb.push(" LIMIT ").push_bind(i64::from(options.take));
    qb.push(" OFFSET ")
        .push_bind(i64::try_from(options.skip).unwrap_or(i64::MAX));
    qb
}

pub fn count_query<'a>(
    schema: &ResourceSchema,
    scope: TenantScope,
    filter: Option<&Predicate>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", quoted(schema.table)));
    push_scope(&mut qb, scope, filter);
    qb
}
