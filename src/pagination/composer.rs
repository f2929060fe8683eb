//! Turns a [`PaginationRequest`] into data-access [`QueryOptions`].
//!
//! Offset mode (a `page` is present) applies the `where__*` filters and skips
//! `take * (page - 1)` rows. Cursor mode ignores filters, over-fetches one row
//! and, when a compatible cursor is supplied, continues strictly after it using
//! `(sort, id)` as a total order.

use super::cursor::{decode_cursor, Cursor};
use super::filter::{parse_where, Comparison, Predicate};
use super::request::PaginationRequest;
use super::schema::{Field, ResourceSchema, SortDirection};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBy {
    pub field: &'static Field,
    pub direction: SortDirection,
}

/// What the data-access layer receives.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<Predicate>,
    pub order: Vec<OrderBy>,
    pub take: u32,
    pub skip: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageMode {
    Offset {
        page: u32,
    },
    Cursor {
        sort: &'static Field,
        direction: SortDirection,
        /// Whether a supplied cursor was actually used as the anchor.
        anchored: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub options: QueryOptions,
    pub mode: PageMode,
    /// Requested page size, before any over-fetch.
    pub take: u32,
}

pub fn compose(schema: &'static ResourceSchema, request: &PaginationRequest) -> Result<ComposedQuery> {
    let sort = resolve_sort_field(schema, request)?;
    let direction = request.sort_direction.unwrap_or(schema.default_direction);
    let order = order_with_tiebreak(schema, sort, direction);

    if let Some(page) = request.page {
        let filter = parse_where(schema, &request.filters)?;
        let skip = u64::from(request.take) * u64::from(page - 1);
        return Ok(ComposedQuery {
            options: QueryOptions {
                filter,
                order,
                take: request.take,
                skip,
            },
            mode: PageMode::Offset { page },
            take: request.take,
        });
    }

    if !request.filters.is_empty() {
        tracing::debug!(
            "Ignoring {} where__ filter(s) in cursor mode",
            request.filters.len()
        );
    }

    let anchor = request
        .cursor
        .as_deref()
        .and_then(|token| usable_cursor(token, sort));
    let filter = anchor
        .as_ref()
        .map(|cursor| keyset_predicate(schema, sort, direction, cursor));

    Ok(ComposedQuery {
        options: QueryOptions {
            filter,
            order,
            take: request.take + 1,
            skip: 0,
        },
        mode: PageMode::Cursor {
            sort,
            direction,
            anchored: anchor.is_some(),
        },
        take: request.take,
    })
}

fn resolve_sort_field(
    schema: &'static ResourceSchema,
    request: &PaginationRequest,
) -> Result<&'static Field> {
    match request.sort_column.as_deref() {
        None => Ok(schema.default_sort_field()),
        Some(name) => schema.sortable_field(name).ok_or_else(|| {
            AppError::invalid_value("sortColumn", name, "column is not sortable")
        }),
    }
}

fn order_with_tiebreak(
    schema: &'static ResourceSchema,
    sort: &'static Field,
    direction: SortDirection,
) -> Vec<OrderBy> {
    let id = schema.id_field();
    let mut order = vec![OrderBy { field: sort, direction }];
    if sort != id {
        order.push(OrderBy { field: id, direction });
    }
    order
}

// A cursor anchors only when it decodes, names the current sort column and
// carries a value of that column's type.
fn usable_cursor(token: &str, sort: &'static Field) -> Option<Cursor> {
    let Some(cursor) = decode_cursor(token) else {
        tracing::debug!("Ignoring undecodable cursor");
        return None;
    };
    if cursor.column != sort.name {
        tracing::debug!(
            "Ignoring cursor for column {} while sorting by {}",
            cursor.column,
            sort.name
        );
        return None;
    }
    if !sort.kind.accepts(&cursor.value) {
        tracing::debug!("Ignoring cursor with mistyped value for {}", sort.name);
        return None;
    }
    Some(cursor)
}

/// `(sort <op> v) OR (sort = v AND id <op> cursor_id)`.
pub fn keyset_predicate(
    schema: &'static ResourceSchema,
    sort: &'static Field,
    direction: SortDirection,
    cursor: &Cursor,
) -> Predicate {
    let op = match direction {
        SortDirection::Asc => Comparison::Gt,
        SortDirection::Desc => Comparison::Lt,
    };
    let id = schema.id_field();
    let after_id = Predicate::compare(id, op, cursor.id.into());

    if sort == id {
        return after_id;
    }

    Predicate::Or(vec![
        Predicate::compare(sort, op, cursor.value.clone()),
        Predicate::And(vec![
            Predicate::compare(sort, Comparison::Eq, cursor.value.clone()),
            after_id,
        ]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::cursor::encode_cursor;
    use crate::pagination::schema::{Listable, Resource};
    use crate::pagination::value::Value;
    use crate::models::member::{tests::member, Member};
    use chrono::{TimeZone, Utc};

    fn request(items: &[(&str, &str)]) -> PaginationRequest {
        PaginationRequest::from_pairs(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .expect("valid request")
    }

    fn schema() -> &'static ResourceSchema {
        Member::schema()
    }

    #[test]
    fn offset_mode_skips_whole_pages() {
        for page in 1..=5u32 {
            let page_str = page.to_string();
            let composed = compose(schema(), &request(&[("page", page_str.as_str()), ("take", "15")]))
                .expect("composes");
            assert_eq!(composed.options.take, 15);
            assert_eq!(composed.options.skip, 15 * u64::from(page - 1));
            assert_eq!(composed.mode, PageMode::Offset { page });
        }
    }

    #[test]
    fn offset_mode_parses_filters_and_orders_with_id_tiebreak() {
        let composed = compose(
            schema(),
            &request(&[
                ("page", "1"),
                ("sortColumn", "name"),
                ("sortDirection", "ASC"),
                ("where__isBaptized", "true"),
            ]),
        )
        .expect("composes");
        assert!(composed.options.filter.is_some());
        let columns: Vec<_> = composed.options.order.iter().map(|o| o.field.column).collect();
        assert_eq!(columns, vec!["name", "id"]);
    }

    #[test]
    fn offset_mode_rejects_unknown_operator_before_querying() {
        let err = compose(schema(), &request(&[("page", "1"), ("where__name__fuzzy_match", "a")]))
            .expect_err("invalid operator");
        assert!(matches!(err, AppError::InvalidQuery { ref key, .. } if key == "where__name__fuzzy_match"));
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        assert!(compose(schema(), &request(&[("sortColumn", "email")])).is_err());
    }

    #[test]
    fn cursor_mode_overfetches_and_has_no_filter_without_cursor() {
        let composed = compose(schema(), &request(&[("take", "10"), ("where__name", "x")]))
            .expect("composes");
        assert_eq!(composed.options.take, 11);
        assert_eq!(composed.options.skip, 0);
        assert!(composed.options.filter.is_none());
        assert_eq!(composed.take, 10);
    }

    #[test]
    fn cursor_for_other_column_is_ignored() {
        let anchor = member(5, "Naomi", Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let token = encode_cursor(&anchor, "name").expect("token");
        let composed = compose(
            schema(),
            &request(&[("cursor", token.as_str()), ("sortColumn", "createdAt")]),
        )
        .expect("no error for mismatched cursor");
        assert!(composed.options.filter.is_none());
        assert!(matches!(composed.mode, PageMode::Cursor { anchored: false, .. }));
    }

    #[test]
    fn garbage_cursor_is_ignored() {
        let composed = compose(schema(), &request(&[("cursor", "definitely-not-a-cursor")]))
            .expect("degrades gracefully");
        assert!(composed.options.filter.is_none());
    }

    #[test]
    fn matching_cursor_builds_keyset_predicate() {
        let anchor = member(5, "Naomi", Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let token = encode_cursor(&anchor, "name").expect("token");
        let composed = compose(
            schema(),
            &request(&[("cursor", token.as_str()), ("sortColumn", "name"), ("sortDirection", "DESC")]),
        )
        .expect("composes");

        let id = schema().id_field();
        let name = schema().field("name").expect("name field");
        let expected = Predicate::Or(vec![
            Predicate::compare(name, Comparison::Lt, Value::from("Naomi")),
            Predicate::And(vec![
                Predicate::compare(name, Comparison::Eq, Value::from("Naomi")),
                Predicate::compare(id, Comparison::Lt, Value::Integer(5)),
            ]),
        ]);
        assert_eq!(composed.options.filter, Some(expected));
    }

    #[test]
    fn id_sorted_cursor_uses_plain_id_bound() {
        let anchor = member(9, "Eli", Utc::now());
        let token = encode_cursor(&anchor, "id").expect("token");
        let composed = compose(
            schema(),
            &request(&[("cursor", token.as_str()), ("sortColumn", "id"), ("sortDirection", "ASC")]),
        )
        .expect("composes");
        assert_eq!(
            composed.options.filter,
            Some(Predicate::compare(
                schema().id_field(),
                Comparison::Gt,
                Value::Integer(9)
            ))
        );
        assert_eq!(composed.options.order.len(), 1);
    }

    #[test]
    fn default_sort_comes_from_schema() {
        let composed = compose(Resource::Groups.schema(), &request(&[])).expect("composes");
        match composed.mode {
            PageMode::Cursor { sort, direction, .. } => {
                assert_eq!(sort.name, Resource::Groups.schema().default_sort);
                assert_eq!(direction, Resource::Groups.schema().default_direction);
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }
}
