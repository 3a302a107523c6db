use sqlx::PgPool;
use tracing::info;

use crate::database::models::{ItemStatus, OrderItem};
use crate::services::error::{DbResultExt, ServiceError};
use crate::types::{Pagination, Scope};

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub item_id: i64,
    pub quantity: i32,
    pub custom_instructions: String,
}

pub struct OrderItemService {
    pool: PgPool,
}

impl OrderItemService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a line to an order the customer owns and that is still open.
    ///
    /// Existence, ownership and open status are checked by the insert itself,
    /// so an order closed concurrently cannot gain new lines.
    pub async fn create(
        &self,
        order_id: i64,
        customer_id: i64,
        new_item: NewOrderItem,
    ) -> Result<OrderItem, ServiceError> {
        if new_item.quantity < 1 {
            return Err(ServiceError::invalid("quantity must be at least 1"));
        }
        if new_item.item_id < 1 {
            return Err(ServiceError::invalid("item id must be positive"));
        }

        let line = sqlx::query_as::<_, OrderItem>(
            "WITH inserted AS (
                 INSERT INTO order_items (order_id, item_id, quantity, custom_instructions)
                 SELECT o.id, $3, $4, $5
                 FROM orders o
                 WHERE o.id = $1 AND o.customer_id = $2 AND o.status = 'open'
                 RETURNING id, order_id, item_id, quantity, custom_instructions, status
             )
             SELECT inserted.id, inserted.order_id, inserted.item_id, items.name AS item_name,
                    inserted.quantity, inserted.custom_instructions, inserted.status
             FROM inserted JOIN items ON items.id = inserted.item_id",
        )
        .bind(order_id)
        .bind(customer_id)
        .bind(new_item.item_id)
        .bind(new_item.quantity)
        .bind(&new_item.custom_instructions)
        .fetch_optional(&self.pool)
        .await
        .invalid_on_reference(&format!("item {} does not exist", new_item.item_id))?
        .ok_or_else(|| ServiceError::not_found(format!("open order {order_id} not found")))?;

        info!(
            "Order {} gained line {} (item {} x{})",
            line.order_id, line.id, line.item_id, line.quantity
        );
        Ok(line)
    }

    /// Overwrite a line's kitchen status. Kitchen staff are not scoped per customer.
    pub async fn edit_status(&self, line_id: i64, status: &str) -> Result<OrderItem, ServiceError> {
        let status: ItemStatus = status.parse()?;

        let line = sqlx::query_as::<_, OrderItem>(
            "WITH updated AS (
                 UPDATE order_items SET status = $2 WHERE id = $1
                 RETURNING id, order_id, item_id, quantity, custom_instructions, status
             )
             SELECT updated.id, updated.order_id, updated.item_id, items.name AS item_name,
                    updated.quantity, updated.custom_instructions, updated.status
             FROM updated JOIN items ON items.id = updated.item_id",
        )
        .bind(line_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("order item {line_id} not found")))?;

        info!("Order item {} marked {}", line.id, line.status);
        Ok(line)
    }

    /// Lines of one order, visible to its owner or an admin.
    pub async fn list_for_order(&self, order_id: i64, scope: Scope) -> Result<Vec<OrderItem>, ServiceError> {
        let visible: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM orders WHERE id = $1 AND ($2::BIGINT IS NULL OR customer_id = $2)",
        )
        .bind(order_id)
        .bind(scope.owner())
        .fetch_optional(&self.pool)
        .await?;
        if visible.is_none() {
            return Err(ServiceError::not_found(format!("order {order_id} not found")));
        }

        let lines = sqlx::query_as::<_, OrderItem>(
            "SELECT oi.id, oi.order_id, oi.item_id, i.name AS item_name,
                    oi.quantity, oi.custom_instructions, oi.status
             FROM order_items oi JOIN items i ON i.id = oi.item_id
             WHERE oi.order_id = $1
             ORDER BY oi.id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    /// Kitchen queue: lines in a given status across all orders, oldest first.
    pub async fn list_by_status(
        &self,
        status: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<OrderItem>, ServiceError> {
        let status = match status {
            Some(raw) => raw.parse::<ItemStatus>()?,
            None => ItemStatus::Preparing,
        };

        let lines = sqlx::query_as::<_, OrderItem>(
            "SELECT oi.id, oi.order_id, oi.item_id, i.name AS item_name,
                    oi.quantity, oi.custom_instructions, oi.status
             FROM order_items oi JOIN items i ON i.id = oi.item_id
             WHERE oi.status = $1
             ORDER BY oi.id
             LIMIT $2 OFFSET $3",
        )
        .bind(status.as_str())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
