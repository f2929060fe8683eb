use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, Group},
    pagination::{Page, PaginationRequest},
    services::list_page,
};

use super::{legacy_links, require_tenant, AppState};

/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Page<Group>>>> {
    let scope = require_tenant(&headers)?;
    let request = PaginationRequest::from_pairs(params)?;

    let page = list_page::<Group, _>(
        &state.db,
        scope,
        &request,
        legacy_links(&state.config, "/api/v1/groups"),
    )
    .await?;

    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/groups/{id}/children
pub async fn list_children(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Group>>>> {
    let scope = require_tenant(&headers)?;

    if state.db.get_group(scope, group_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Group {}", group_id)));
    }
    let children = state.db.list_child_groups(scope, group_id).await?;
    tracing::debug!("Group {} has {} direct children", group_id, children.len());

    Ok(Json(ApiResponse::success(children)))
}
