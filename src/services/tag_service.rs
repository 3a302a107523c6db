use sqlx::PgPool;
use tracing::info;

use crate::database::models::Tag;
use crate::services::error::{DbResultExt, ServiceError};
use crate::types::Pagination;

pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &str) -> Result<Tag, ServiceError> {
        let name = validate_name(name)?;
        let tag = sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .conflict_on_unique(&format!("tag '{name}' already exists"))?;

        info!("Created tag {} ({})", tag.id, tag.name);
        Ok(tag)
    }

    pub async fn get(&self, tag_id: i64) -> Result<Tag, ServiceError> {
        sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("tag {tag_id} not found")))
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<Tag>, ServiceError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    pub async fn rename(&self, tag_id: i64, name: &str) -> Result<Tag, ServiceError> {
        let name = validate_name(name)?;
        let tag = sqlx::query_as::<_, Tag>("UPDATE tags SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(tag_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .conflict_on_unique(&format!("tag '{name}' already exists"))?
            .ok_or_else(|| ServiceError::not_found(format!("tag {tag_id} not found")))?;

        info!("Renamed tag {} to {}", tag.id, tag.name);
        Ok(tag)
    }
}

fn validate_name(name: &str) -> Result<&str, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("tag name is required"));
    }
    Ok(name)
}
