use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use crate::database::models::{Item, Tag};
use crate::services::error::{DbResultExt, ServiceError};
use crate::services::{check_money, like_pattern};
use crate::types::Pagination;

/// `items.price` is `NUMERIC(10, 2)`.
const MAX_PRICE: i64 = 100_000_000;

const ITEM_COLUMNS: &str = "id, name, description, price, image_url, is_available";

/// Writable fields of a menu item. Tags are referenced by name.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    /// Comma separated tag names; an item matches if it carries any of them.
    pub tags: Option<String>,
    pub search: Option<String>,
    pub available: Option<bool>,
}

impl ItemFilter {
    fn tag_names(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct ItemService {
    pool: PgPool,
}

impl ItemService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an item and its tag links in one transaction.
    pub async fn create(&self, input: ItemInput) -> Result<Item, ServiceError> {
        validate_item(&input)?;
        let mut tx = self.pool.begin().await?;

        let tags = resolve_tags(&mut tx, &input.tags).await?;
        let sql = format!(
            "INSERT INTO items (name, description, price, image_url, is_available)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ITEM_COLUMNS}"
        );
        let mut item = sqlx::query_as::<_, Item>(&sql)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.image_url)
            .bind(input.is_available)
            .fetch_one(&mut *tx)
            .await
            .conflict_on_unique(&duplicate_name(&input.name))?;

        link_tags(&mut tx, item.id, &tags).await?;
        tx.commit().await?;

        item.tags = tags;
        info!("Created item {} ({}) with {} tags", item.id, item.name, item.tags.len());
        Ok(item)
    }

    /// Overwrite an item and replace its whole tag set in one transaction.
    pub async fn edit(&self, item_id: i64, input: ItemInput) -> Result<Item, ServiceError> {
        validate_item(&input)?;
        let mut tx = self.pool.begin().await?;

        let tags = resolve_tags(&mut tx, &input.tags).await?;
        let sql = format!(
            "UPDATE items
             SET name = $2, description = $3, price = $4, image_url = $5, is_available = $6
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        );
        let mut item = sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.image_url)
            .bind(input.is_available)
            .fetch_optional(&mut *tx)
            .await
            .conflict_on_unique(&duplicate_name(&input.name))?
            .ok_or_else(|| ServiceError::not_found(format!("item {item_id} not found")))?;

        sqlx::query("DELETE FROM item_tags WHERE item_id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        link_tags(&mut tx, item_id, &tags).await?;
        tx.commit().await?;

        item.tags = tags;
        info!("Updated item {} ({})", item.id, item.name);
        Ok(item)
    }

    pub async fn get(&self, item_id: i64) -> Result<Item, ServiceError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("item {item_id} not found")))?;

        let mut items = self.attach_tags(vec![item]).await?;
        items
            .pop()
            .ok_or_else(|| ServiceError::Internal("item vanished while loading tags".to_string()))
    }

    pub async fn list(&self, filter: ItemFilter, page: Pagination) -> Result<Vec<Item>, ServiceError> {
        let tag_names = filter.tag_names();
        let pattern = like_pattern(filter.search.as_deref());

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items i
             WHERE ($1::TEXT IS NULL OR i.name ILIKE $1 OR i.description ILIKE $1)
               AND ($2::BOOLEAN IS NULL OR i.is_available = $2)
               AND (cardinality($3::TEXT[]) = 0 OR EXISTS (
                   SELECT 1 FROM item_tags it JOIN tags t ON t.id = it.tag_id
                   WHERE it.item_id = i.id AND t.name = ANY($3)
               ))
             ORDER BY i.id
             LIMIT $4 OFFSET $5"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(pattern)
            .bind(filter.available)
            .bind(&tag_names)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        self.attach_tags(items).await
    }

    async fn attach_tags(&self, mut items: Vec<Item>) -> Result<Vec<Item>, ServiceError> {
        if items.is_empty() {
            return Ok(items);
        }
        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT it.item_id, t.id, t.name
             FROM item_tags it JOIN tags t ON t.id = it.tag_id
             WHERE it.item_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_item: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (item_id, id, name) in rows {
            by_item.entry(item_id).or_default().push(Tag { id, name });
        }
        for item in &mut items {
            item.tags = by_item.remove(&item.id).unwrap_or_default();
        }
        Ok(items)
    }
}

/// Look up tags by name, failing if any name is unknown.
async fn resolve_tags(
    tx: &mut Transaction<'_, Postgres>,
    names: &[String],
) -> Result<Vec<Tag>, ServiceError> {
    let wanted: BTreeSet<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    let wanted_vec: Vec<&str> = wanted.iter().copied().collect();

    let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ANY($1) ORDER BY name")
        .bind(&wanted_vec)
        .fetch_all(&mut **tx)
        .await?;

    if tags.len() != wanted.len() {
        let missing: Vec<&str> = wanted
            .into_iter()
            .filter(|name| !tags.iter().any(|t| t.name == *name))
            .collect();
        return Err(ServiceError::invalid(format!("unknown tags: {}", missing.join(", "))));
    }
    Ok(tags)
}

async fn link_tags(
    tx: &mut Transaction<'_, Postgres>,
    item_id: i64,
    tags: &[Tag],
) -> Result<(), ServiceError> {
    if tags.is_empty() {
        return Ok(());
    }
    let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
    sqlx::query("INSERT INTO item_tags (item_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(item_id)
        .bind(&tag_ids)
        .execute(&mut **tx)
        .await
        .invalid_on_reference("tag was removed while saving the item")?;
    Ok(())
}

fn validate_item(input: &ItemInput) -> Result<(), ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::invalid("item name is required"));
    }
    if input.price <= Decimal::ZERO {
        return Err(ServiceError::invalid("price must be greater than zero"));
    }
    check_money(input.price, Decimal::from(MAX_PRICE), "price")
}

fn duplicate_name(name: &str) -> String {
    format!("an item named '{}' already exists", name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, price: Decimal) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            description: String::new(),
            price,
            image_url: String::new(),
            is_available: true,
            tags: vec![],
        }
    }

    #[test]
    fn price_must_be_positive() {
        assert!(validate_item(&input("Soup", Decimal::new(450, 2))).is_ok());
        assert!(validate_item(&input("Soup", Decimal::ZERO)).is_err());
        assert!(validate_item(&input("Soup", Decimal::new(-1, 0))).is_err());
        assert!(validate_item(&input("  ", Decimal::ONE)).is_err());
    }

    #[test]
    fn price_must_fit_the_column() {
        assert!(validate_item(&input("Soup", Decimal::new(9_999_999_999, 2))).is_ok());
        assert!(matches!(
            validate_item(&input("Soup", Decimal::new(1_000_000_000, 0))),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_item(&input("Soup", Decimal::new(4999, 3))),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn tag_filter_splits_on_commas() {
        let filter = ItemFilter {
            tags: Some("vegan, spicy,,".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.tag_names(), vec!["vegan", "spicy"]);
        assert!(ItemFilter::default().tag_names().is_empty());
    }

    #[test]
    fn input_defaults() {
        let parsed: ItemInput =
            serde_json::from_value(serde_json::json!({"name": "Tea", "price": "2.50"})).unwrap();
        assert!(parsed.is_available);
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.price, Decimal::new(250, 2));
    }
}
