use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Tag;

/// Menu item with its tag set. `tags` is filled from `item_tags` after the row is read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: String,
    pub is_available: bool,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}
