// handlers/orders.rs - /api/orders

use axum::extract::State;
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::Identity;
use crate::database::models::Order;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::OrderFilter;
use crate::types::{Page, PageParams, Scope};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub table_number: i32,
}

/// POST /api/orders - open an order for a table (409 if the table is taken)
pub async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> ApiResult<Order> {
    let order = state.orders().create(identity.user_id, body.table_number).await?;
    Ok(ApiResponse::created(order))
}

/// GET /api/orders - customers see only their own orders
pub async fn list_orders(
    State(state): State<AppState>,
    identity: Identity,
    ApiQuery(filter): ApiQuery<OrderFilter>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<Order>> {
    let page = state.paginate(params)?;
    let orders = state
        .orders()
        .list(filter, Scope::for_identity(&identity), page)
        .await?;
    Ok(ApiResponse::success(Page::new(orders, page)))
}

/// GET /api/orders/:id - 404 for orders that do not exist or belong to someone else
pub async fn get_order(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<Order> {
    let order = state.orders().get(order_id, Scope::for_identity(&identity)).await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/close
pub async fn close_order(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<Order> {
    let order = state.orders().close(order_id, Scope::for_identity(&identity)).await?;
    Ok(ApiResponse::success(order))
}
