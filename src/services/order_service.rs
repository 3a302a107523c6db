use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::models::{Order, OrderStatus};
use crate::services::error::{DbResultExt, ServiceError};
use crate::types::{Pagination, Scope};

pub const MIN_TABLE_NUMBER: i32 = 1;
pub const MAX_TABLE_NUMBER: i32 = 100;

const ORDER_COLUMNS: &str = "id, customer_id, status, table_number, ordered_at";

/// Listing filters. `customer_id` only takes effect for unrestricted callers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub table_number: Option<i32>,
    pub date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    #[serde(alias = "user_id")]
    pub customer_id: Option<i64>,
}

pub struct OrderService {
    pool: PgPool,
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open an order for a table.
    ///
    /// The insert only happens if no open order exists for the table. Two
    /// concurrent callers that both pass that check are separated by the
    /// partial unique index, and the loser sees `Conflict`.
    pub async fn create(&self, customer_id: i64, table_number: i32) -> Result<Order, ServiceError> {
        validate_table_number(table_number)?;

        let sql = format!(
            "INSERT INTO orders (customer_id, table_number)
             SELECT $1, $2
             WHERE NOT EXISTS (
                 SELECT 1 FROM orders WHERE table_number = $2 AND status = 'open'
             )
             RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .bind(table_number)
            .fetch_optional(&self.pool)
            .await
            .conflict_on_unique(&table_taken(table_number))
            .invalid_on_reference("customer does not exist")?
            .ok_or_else(|| ServiceError::conflict(table_taken(table_number)))?;

        info!(
            "Order {} opened for table {} by user {}",
            order.id, order.table_number, order.customer_id
        );
        Ok(order)
    }

    /// Close an open order the caller owns, or any open order for an admin.
    ///
    /// Missing, foreign and already closed orders all yield `NotFound`.
    pub async fn close(&self, order_id: i64, scope: Scope) -> Result<Order, ServiceError> {
        let sql = format!(
            "UPDATE orders SET status = 'closed'
             WHERE id = $1
               AND status = 'open'
               AND ($2::BIGINT IS NULL OR customer_id = $2)
             RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("open order {order_id} not found")))?;

        info!("Order {} closed (scope {:?})", order.id, scope);
        Ok(order)
    }

    pub async fn get(&self, order_id: i64, scope: Scope) -> Result<Order, ServiceError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE id = $1 AND ($2::BIGINT IS NULL OR customer_id = $2)"
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("order {order_id} not found")))
    }

    /// List orders newest first. Restricted callers only ever see their own
    /// orders, whatever customer filter they pass.
    pub async fn list(
        &self,
        filter: OrderFilter,
        scope: Scope,
        page: Pagination,
    ) -> Result<Vec<Order>, ServiceError> {
        if let Some(table_number) = filter.table_number {
            validate_table_number(table_number)?;
        }
        let customer_id = match scope {
            Scope::OwnedBy(id) => Some(id),
            Scope::Unrestricted => filter.customer_id,
        };
        debug!("Listing orders for customer {:?} with {:?}", customer_id, filter);

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE ($1::BIGINT IS NULL OR customer_id = $1)
               AND ($2::INTEGER IS NULL OR table_number = $2)
               AND ($3::TEXT IS NULL OR status = $3)
               AND ($4::DATE IS NULL OR ordered_at::date = $4)
             ORDER BY ordered_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .bind(filter.table_number)
            .bind(filter.status.map(OrderStatus::as_str))
            .bind(filter.date)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }
}

pub fn validate_table_number(table_number: i32) -> Result<(), ServiceError> {
    if !(MIN_TABLE_NUMBER..=MAX_TABLE_NUMBER).contains(&table_number) {
        return Err(ServiceError::invalid(format!(
            "table number must be between {MIN_TABLE_NUMBER} and {MAX_TABLE_NUMBER}"
        )));
    }
    Ok(())
}

fn table_taken(table_number: i32) -> String {
    format!("table {table_number} already has an open order")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_number_bounds() {
        assert!(validate_table_number(1).is_ok());
        assert!(validate_table_number(100).is_ok());
        assert!(matches!(validate_table_number(0), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(validate_table_number(101), Err(ServiceError::InvalidInput(_))));
        assert!(validate_table_number(-5).is_err());
    }

    #[test]
    fn filter_accepts_user_id_alias() {
        let filter: OrderFilter =
            serde_json::from_value(serde_json::json!({"user_id": 4, "status": "open"})).unwrap();
        assert_eq!(filter.customer_id, Some(4));
        assert_eq!(filter.status, Some(OrderStatus::Open));
    }
}
