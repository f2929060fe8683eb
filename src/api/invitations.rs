use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    error::Result,
    models::{ApiResponse, CreateInvitationRequest, Invitation},
    pagination::{Page, PaginationRequest},
    services::list_page,
};

use super::{legacy_links, require_tenant, AppState};

/// GET /api/v1/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Page<Invitation>>>> {
    let scope = require_tenant(&headers)?;
    let request = PaginationRequest::from_pairs(params)?;

    let page = list_page::<Invitation, _>(
        &state.db,
        scope,
        &request,
        legacy_links(&state.config, "/api/v1/invitations"),
    )
    .await?;

    Ok(Json(ApiResponse::success(page)))
}

/// POST /api/v1/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Invitation>>)> {
    let scope = require_tenant(&headers)?;
    let invitation = state.invitations.request(scope, req).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(invitation))))
}

/// POST /api/v1/invitations/{id}/retry
pub async fn retry_invitation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(invitation_id): Path<i64>,
) -> Result<Json<ApiResponse<Invitation>>> {
    let scope = require_tenant(&headers)?;
    let invitation = state.invitations.retry(scope, invitation_id).await?;

    Ok(Json(ApiResponse::success(invitation)))
}
