use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::text_enum;

text_enum!(
    PaymentStatus, "payment status" {
        Processing => "processing",
        Accepted => "accepted",
    }
);

/// Stored payment columns. There is no total column.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub subtotal: Decimal,
    pub tip: Decimal,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub cashier_id: i64,
}

/// Payment as returned to callers, with `total` derived from the stored parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub subtotal: Decimal,
    pub tip: Decimal,
    pub total: Decimal,
    pub status: PaymentStatus,
    pub cashier_id: i64,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            subtotal: row.subtotal,
            tip: row.tip,
            total: row.subtotal + row.tip,
            status: row.status,
            cashier_id: row.cashier_id,
        }
    }
}
