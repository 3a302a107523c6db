// handlers/requests.rs - /api/requests (role elevation)

use axum::extract::State;
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::{Identity, Role};
use crate::database::models::RoleRequest;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Decision, RequestFilter};
use crate::types::{Page, PageParams};

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub role: Role,
}

pub async fn create_request(
    State(state): State<AppState>,
    identity: Identity,
    ApiJson(body): ApiJson<CreateRequestBody>,
) -> ApiResult<RoleRequest> {
    let request = state.requests().create(identity.user_id, body.role).await?;
    Ok(ApiResponse::created(request))
}

/// GET /api/requests - non-admins get their own unseen requests by default
pub async fn list_requests(
    State(state): State<AppState>,
    identity: Identity,
    ApiQuery(filter): ApiQuery<RequestFilter>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<RoleRequest>> {
    let page = state.paginate(params)?;
    let requests = state.requests().list(filter, &identity, page).await?;
    Ok(ApiResponse::success(Page::new(requests, page)))
}

pub async fn grant_request(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(request_id): ApiPath<i64>,
) -> ApiResult<RoleRequest> {
    let request = state
        .requests()
        .decide(request_id, Decision::Grant, identity.user_id)
        .await?;
    Ok(ApiResponse::success(request))
}

pub async fn reject_request(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(request_id): ApiPath<i64>,
) -> ApiResult<RoleRequest> {
    let request = state
        .requests()
        .decide(request_id, Decision::Reject, identity.user_id)
        .await?;
    Ok(ApiResponse::success(request))
}

/// POST /api/requests/:id/seen - owner acknowledges the outcome
pub async fn mark_request_seen(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(request_id): ApiPath<i64>,
) -> ApiResult<RoleRequest> {
    let request = state
        .requests()
        .mark_seen(request_id, identity.user_id)
        .await?;
    Ok(ApiResponse::success(request))
}
