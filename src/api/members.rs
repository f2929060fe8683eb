use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    error::Result,
    models::{ApiResponse, Member},
    pagination::{Page, PaginationRequest},
    services::list_page,
};

use super::{legacy_links, require_tenant, AppState};

/// GET /api/v1/members
pub async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Page<Member>>>> {
    let scope = require_tenant(&headers)?;
    let request = PaginationRequest::from_pairs(params)?;

    let page = list_page::<Member, _>(
        &state.db,
        scope,
        &request,
        legacy_links(&state.config, "/api/v1/members"),
    )
    .await?;

    Ok(Json(ApiResponse::success(page)))
}
