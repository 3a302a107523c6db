use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::text_enum;

text_enum!(
    /// An open order accepts new items; a closed one is terminal.
    OrderStatus, "order status" {
        Open => "open",
        Closed => "closed",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub table_number: i32,
    pub ordered_at: DateTime<Utc>,
}
