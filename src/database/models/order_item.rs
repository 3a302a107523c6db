use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::text_enum;

text_enum!(
    /// Kitchen progress of a single order line.
    ItemStatus, "item status" {
        Preparing => "preparing",
        Completed => "completed",
        Pending => "pending",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i32,
    pub custom_instructions: String,
    #[sqlx(try_from = "String")]
    pub status: ItemStatus,
}
