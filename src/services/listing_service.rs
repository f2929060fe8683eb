use url::Url;

use crate::{
    db::RecordStore,
    error::Result,
    models::TenantScope,
    pagination::{
        compose, finish_cursor_page, legacy_next_page_url, Listable, OffsetPage, Page, PageMode,
        PaginationRequest,
    },
};

/// Where offset-mode "next page" links point, when enabled.
#[derive(Debug, Clone, Copy)]
pub struct LegacyLinks<'a> {
    pub base: &'a Url,
    pub path: &'a str,
}

/// Compose, fetch and assemble one page of `R`.
pub async fn list_page<R, S>(
    store: &S,
    scope: TenantScope,
    request: &PaginationRequest,
    links: Option<LegacyLinks<'_>>,
) -> Result<Page<R>>
where
    R: Listable + Send,
    S: RecordStore<R> + ?Sized,
{
    let composed = compose(R::schema(), request)?;
    let rows = store.find(scope, &composed.options).await?;

    match composed.mode {
        PageMode::Offset { page } => {
            let count = store.count(scope, composed.options.filter.as_ref()).await?;
            let next_page_url = match (links, rows.last()) {
                (Some(links), Some(last)) if rows.len() == composed.take as usize => {
                    let order = composed.options.order[0];
                    legacy_next_page_url(
                        links.base,
                        links.path,
                        &request.raw,
                        order.field,
                        order.direction,
                        last.id(),
                    )
                }
                _ => None,
            };
            tracing::debug!(
                "{} offset page {}: {} of {} rows",
                R::RESOURCE.as_str(),
                page,
                rows.len(),
                count
            );
            Ok(Page::Offset(OffsetPage {
                items: rows,
                count,
                next_page_url,
            }))
        }
        PageMode::Cursor { sort, anchored, .. } => {
            let page = finish_cursor_page(rows, composed.take, sort);
            tracing::debug!(
                "{} cursor page (anchored: {}): {} rows, has_more: {}",
                R::RESOURCE.as_str(),
                anchored,
                page.count,
                page.has_more
            );
            Ok(Page::Cursor(page))
        }
    }
}
