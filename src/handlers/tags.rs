// handlers/tags.rs - /api/tags

use axum::extract::State;
use serde::Deserialize;

use crate::api::AppState;
use crate::database::models::Tag;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{Page, PageParams};

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub name: String,
}

pub async fn create_tag(State(state): State<AppState>, ApiJson(body): ApiJson<TagBody>) -> ApiResult<Tag> {
    let tag = state.tags().create(&body.name).await?;
    Ok(ApiResponse::created(tag))
}

pub async fn get_tag(State(state): State<AppState>, ApiPath(tag_id): ApiPath<i64>) -> ApiResult<Tag> {
    Ok(ApiResponse::success(state.tags().get(tag_id).await?))
}

pub async fn list_tags(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<Tag>> {
    let page = state.paginate(params)?;
    let tags = state.tags().list(page).await?;
    Ok(ApiResponse::success(Page::new(tags, page)))
}

pub async fn rename_tag(
    State(state): State<AppState>,
    ApiPath(tag_id): ApiPath<i64>,
    ApiJson(body): ApiJson<TagBody>,
) -> ApiResult<Tag> {
    Ok(ApiResponse::success(state.tags().rename(tag_id, &body.name).await?))
}
