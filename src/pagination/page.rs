use serde::Serialize;
use url::Url;

use super::cursor::encode_cursor;
use super::schema::{Field, Listable, SortDirection};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    /// Total rows matching the filter, not just this page.
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Page<T> {
    Offset(OffsetPage<T>),
    Cursor(CursorPage<T>),
}

/// Trims the over-fetched row and derives `has_more` / `next_cursor`.
pub fn finish_cursor_page<R: Listable>(mut rows: Vec<R>, take: u32, sort: &Field) -> CursorPage<R> {
    let take = take as usize;
    let has_more = rows.len() > take;
    rows.truncate(take);

    let next_cursor = if has_more {
        let cursor = rows.last().and_then(|last| encode_cursor(last, sort.name));
        if cursor.is_none() {
            tracing::warn!("Could not encode cursor for sort column {}", sort.name);
        }
        cursor
    } else {
        None
    };

    CursorPage {
        count: rows.len(),
        items: rows,
        next_cursor,
        has_more,
    }
}

const ID_BOUND_KEYS: [&str; 2] = ["where__id__more_than", "where__id__less_than"];

/// Offset-mode "infinite scroll" link for clients that still follow it.
///
/// Only meaningful when rows are ordered by `id`: the link pins `page=1` and
/// replaces any id bound with one past the last row (`more_than` ascending,
/// `less_than` descending). Other parameters are echoed unchanged.
pub fn legacy_next_page_url(
    base: &Url,
    path: &str,
    params: &[(String, String)],
    sort: &Field,
    direction: SortDirection,
    last_id: i64,
) -> Option<String> {
    if sort.name != "id" {
        return None;
    }

    let mut url = base.join(path.trim_start_matches('/')).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.append_pair("page", "1");
        for (key, value) in params {
            if key == "page" || ID_BOUND_KEYS.contains(&key.as_str()) {
                continue;
            }
            query.append_pair(key, value);
        }
        let bound = match direction {
            SortDirection::Asc => ID_BOUND_KEYS[0],
            SortDirection::Desc => ID_BOUND_KEYS[1],
        };
        query.append_pair(bound, &last_id.to_string());
    }
    Some(url.to_string())
}
