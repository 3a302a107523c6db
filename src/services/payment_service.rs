use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::database::models::{Payment, PaymentRow, PaymentStatus};
use crate::services::check_money;
use crate::services::error::{DbResultExt, ServiceError};
use crate::types::{Pagination, Scope};

/// `payments.subtotal` and `payments.tip` are `NUMERIC(12, 2)`.
const MAX_AMOUNT: i64 = 10_000_000_000;

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, subtotal, tip, status, cashier_id";

/// Listing filters. `user_id` only takes effect for unrestricted callers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub order_id: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub user_id: Option<i64>,
}

impl PaymentFilter {
    fn user_for(&self, scope: Scope) -> Option<i64> {
        match scope {
            Scope::OwnedBy(id) => Some(id),
            Scope::Unrestricted => self.user_id,
        }
    }
}

pub struct PaymentService {
    pool: PgPool,
}

impl PaymentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Settle an order.
    ///
    /// The subtotal is priced from the order's current lines at current item
    /// prices inside the same transaction that writes the payment. The payment
    /// belongs to the order's customer; `cashier_id` records who took it.
    pub async fn create(
        &self,
        order_id: i64,
        tip: Decimal,
        cashier_id: i64,
        scope: Scope,
    ) -> Result<Payment, ServiceError> {
        validate_tip(tip)?;

        let mut tx = self.pool.begin().await?;

        let customer_id: i64 = sqlx::query_scalar(
            "SELECT customer_id FROM orders
             WHERE id = $1 AND ($2::BIGINT IS NULL OR customer_id = $2)
             FOR UPDATE",
        )
        .bind(order_id)
        .bind(scope.owner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("order {order_id} not found")))?;

        let lines: Vec<(i32, Decimal)> = sqlx::query_as(
            "SELECT oi.quantity, i.price
             FROM order_items oi JOIN items i ON i.id = oi.item_id
             WHERE oi.order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;
        let subtotal = compute_subtotal(&lines)
            .ok_or_else(|| ServiceError::invalid(format!("order {order_id} has no items")))?;
        if subtotal >= Decimal::from(MAX_AMOUNT) {
            return Err(ServiceError::invalid(format!(
                "order {order_id} subtotal {subtotal} is too large to settle"
            )));
        }

        let sql = format!(
            "INSERT INTO payments (order_id, user_id, subtotal, tip, cashier_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PAYMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(order_id)
            .bind(customer_id)
            .bind(subtotal)
            .bind(tip)
            .bind(cashier_id)
            .fetch_one(&mut *tx)
            .await
            .invalid_on_reference("cashier does not exist")?;

        tx.commit().await?;

        let payment = Payment::from(row);
        info!(
            "Payment {} created for order {}: subtotal {} tip {} total {}",
            payment.id, payment.order_id, payment.subtotal, payment.tip, payment.total
        );
        Ok(payment)
    }

    /// Move a payment to `processing` or `accepted`; any other target is invalid.
    pub async fn update_status(&self, payment_id: i64, status: &str) -> Result<Payment, ServiceError> {
        let status: PaymentStatus = status.parse()?;

        let sql = format!(
            "UPDATE payments SET status = $2 WHERE id = $1 RETURNING {PAYMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("payment {payment_id} not found")))?;

        info!("Payment {} marked {}", row.id, row.status);
        Ok(row.into())
    }

    pub async fn get(&self, payment_id: i64, scope: Scope) -> Result<Payment, ServiceError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE id = $1 AND ($2::BIGINT IS NULL OR user_id = $2)"
        );
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment_id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?
            .map(Payment::from)
            .ok_or_else(|| ServiceError::not_found(format!("payment {payment_id} not found")))
    }

    /// List payments newest first. Restricted callers only ever see their own
    /// payments, whatever user filter they pass.
    pub async fn list(
        &self,
        filter: PaymentFilter,
        scope: Scope,
        page: Pagination,
    ) -> Result<Vec<Payment>, ServiceError> {
        let user_id = filter.user_for(scope);
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::BIGINT IS NULL OR order_id = $2)
               AND ($3::TEXT IS NULL OR status = $3)
             ORDER BY id DESC
             LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(user_id)
            .bind(filter.order_id)
            .bind(filter.status.map(PaymentStatus::as_str))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }
}

fn validate_tip(tip: Decimal) -> Result<(), ServiceError> {
    if tip < Decimal::ZERO {
        return Err(ServiceError::invalid("tip must not be negative"));
    }
    check_money(tip, Decimal::from(MAX_AMOUNT), "tip")
}

/// Sum of quantity × unit price over an order's lines, or `None` for an empty order.
pub fn compute_subtotal(lines: &[(i32, Decimal)]) -> Option<Decimal> {
    if lines.is_empty() {
        return None;
    }
    Some(
        lines
            .iter()
            .map(|(quantity, price)| Decimal::from(*quantity) * *price)
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_multiplies_quantity_by_price() {
        let lines = [(2, Decimal::new(1250, 2)), (1, Decimal::new(399, 2))];
        assert_eq!(compute_subtotal(&lines), Some(Decimal::new(2899, 2)));
    }

    #[test]
    fn tip_must_be_non_negative_and_fit_the_column() {
        assert!(validate_tip(Decimal::ZERO).is_ok());
        assert!(validate_tip(Decimal::new(300, 2)).is_ok());
        assert!(matches!(validate_tip(Decimal::new(-1, 2)), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(
            validate_tip(Decimal::new(100_000_000_000, 0)),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(validate_tip(Decimal::new(1005, 3)), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn user_filter_only_applies_to_unrestricted_callers() {
        let filter: PaymentFilter =
            serde_json::from_value(serde_json::json!({"user_id": 9, "status": "accepted"})).unwrap();
        assert_eq!(filter.status, Some(PaymentStatus::Accepted));
        assert_eq!(filter.user_for(Scope::OwnedBy(4)), Some(4));
        assert_eq!(filter.user_for(Scope::Unrestricted), Some(9));
        assert_eq!(PaymentFilter::default().user_for(Scope::Unrestricted), None);
    }

    #[test]
    fn empty_order_has_no_subtotal() {
        assert_eq!(compute_subtotal(&[]), None);
    }

    #[test]
    fn subtotal_keeps_cents_exact() {
        let lines = [(3, Decimal::new(10, 2)); 10];
        assert_eq!(compute_subtotal(&lines), Some(Decimal::new(300, 2)));
    }
}
