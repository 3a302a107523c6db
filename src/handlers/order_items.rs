// handlers/order_items.rs - order lines and the kitchen queue

use axum::extract::State;
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::Identity;
use crate::database::models::OrderItem;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::NewOrderItem;
use crate::types::{Page, PageParams, Scope};

#[derive(Debug, Deserialize)]
pub struct CreateOrderItemRequest {
    pub item_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub custom_instructions: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct KitchenQuery {
    pub status: Option<String>,
}

/// POST /api/orders/:id/items - only into the caller's own open order
pub async fn create_order_item(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(order_id): ApiPath<i64>,
    ApiJson(body): ApiJson<CreateOrderItemRequest>,
) -> ApiResult<OrderItem> {
    let line = state
        .order_items()
        .create(
            order_id,
            identity.user_id,
            NewOrderItem {
                item_id: body.item_id,
                quantity: body.quantity,
                custom_instructions: body.custom_instructions,
            },
        )
        .await?;
    Ok(ApiResponse::created(line))
}

/// GET /api/orders/:id/items
pub async fn list_order_items(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<Vec<OrderItem>> {
    let lines = state
        .order_items()
        .list_for_order(order_id, Scope::for_identity(&identity))
        .await?;
    Ok(ApiResponse::success(lines))
}

/// GET /api/orders/items?status= - kitchen queue, defaults to preparing
pub async fn kitchen_queue(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<KitchenQuery>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<OrderItem>> {
    let page = state.paginate(params)?;
    let lines = state
        .order_items()
        .list_by_status(query.status.as_deref(), page)
        .await?;
    Ok(ApiResponse::success(Page::new(lines, page)))
}

/// PATCH /api/orders/items/:id
pub async fn edit_order_item_status(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<OrderItem> {
    let line = state.order_items().edit_status(line_id, &body.status).await?;
    Ok(ApiResponse::success(line))
}
