// handlers/payments.rs - /api/payments

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::Identity;
use crate::database::models::Payment;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::order_items::StatusBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PaymentFilter;
use crate::types::{Page, PageParams, Scope};

/// Only the order and tip are accepted; subtotal and total are always computed.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: i64,
    #[serde(default)]
    pub tip: Decimal,
}

/// POST /api/payments - the caller is recorded as cashier
pub async fn create_payment(
    State(state): State<AppState>,
    identity: Identity,
    ApiJson(body): ApiJson<CreatePaymentRequest>,
) -> ApiResult<Payment> {
    let payment = state
        .payments()
        .create(body.order_id, body.tip, identity.user_id, Scope::for_identity(&identity))
        .await?;
    Ok(ApiResponse::created(payment))
}

pub async fn get_payment(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(payment_id): ApiPath<i64>,
) -> ApiResult<Payment> {
    let payment = state
        .payments()
        .get(payment_id, Scope::for_identity(&identity))
        .await?;
    Ok(ApiResponse::success(payment))
}

pub async fn list_payments(
    State(state): State<AppState>,
    identity: Identity,
    ApiQuery(filter): ApiQuery<PaymentFilter>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Page<Payment>> {
    let page = state.paginate(params)?;
    let payments = state
        .payments()
        .list(filter, Scope::for_identity(&identity), page)
        .await?;
    Ok(ApiResponse::success(Page::new(payments, page)))
}

/// PATCH /api/payments/:id - status must be processing or accepted
pub async fn update_payment_status(
    State(state): State<AppState>,
    ApiPath(payment_id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<Payment> {
    let payment = state
        .payments()
        .update_status(payment_id, &body.status)
        .await?;
    Ok(ApiResponse::success(payment))
}
