// handlers/users.rs - /api/users

use axum::extract::State;
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::Identity;
use crate::database::models::User;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{UserFilter, UserUpdate};
use crate::types::{Page, PageParams};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/users - open registration, always as a customer
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<User> {
    let user = state
        .users()
        .register(&body.name, &body.email, &body.password)
        .await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<User> {
    let user = state.users().get(user_id, &identity).await?;
    Ok(ApiResponse::success(user))
}

/// PATCH /api/users/:id
pub async fn edit_user(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> ApiResult<User> {
    let user = state.users().edit(user_id, &identity, body).await?;
    Ok(ApiResponse::success(user))
}

/// GET /api/users - admin search
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<UserFilter>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<User>> {
    let page = state.paginate(params)?;
    let users = state.users().list(filter, page).await?;
    Ok(ApiResponse::success(Page::new(users, page)))
}
