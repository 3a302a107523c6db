// handlers/items.rs - /api/items (menu catalog)

use axum::extract::State;

use crate::api::AppState;
use crate::database::models::Item;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{ItemFilter, ItemInput};
use crate::types::{Page, PageParams};

pub async fn create_item(State(state): State<AppState>, ApiJson(body): ApiJson<ItemInput>) -> ApiResult<Item> {
    Ok(ApiResponse::created(state.items().create(body).await?))
}

/// PUT /api/items/:id - full replacement, including the tag set
pub async fn edit_item(
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ItemInput>,
) -> ApiResult<Item> {
    Ok(ApiResponse::success(state.items().edit(item_id, body).await?))
}

pub async fn get_item(State(state): State<AppState>, ApiPath(item_id): ApiPath<i64>) -> ApiResult<Item> {
    Ok(ApiResponse::success(state.items().get(item_id).await?))
}

pub async fn list_items(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ItemFilter>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<Item>> {
    let page = state.paginate(params)?;
    let items = state.items().list(filter, page).await?;
    Ok(ApiResponse::success(Page::new(items, page)))
}
