use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::{password, Identity, Role};
use crate::config::BootstrapConfig;
use crate::database::models::{User, UserCredentials};
use crate::services::error::{DbResultExt, ServiceError};
use crate::services::like_pattern;
use crate::types::Pagination;

const DUPLICATE_USER: &str = "a user with that name or email already exists";
const BAD_CREDENTIALS: &str = "invalid username or password";

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer account. Role elevation only happens through requests.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, ServiceError> {
        let (name, email) = validate_profile(name, email)?;
        if password.is_empty() {
            return Err(ServiceError::invalid("password is required"));
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, email, role",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(i16::from(Role::CUSTOMER))
        .fetch_one(&self.pool)
        .await
        .conflict_on_unique(DUPLICATE_USER)?;

        info!("Registered user {} ({})", user.id, user.name);
        Ok(user)
    }

    /// Check a username and password. Unknown names and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn verify_credentials(&self, name: &str, password: &str) -> Result<Identity, ServiceError> {
        if name.is_empty() || password.is_empty() {
            return Err(ServiceError::invalid("username and password are required"));
        }

        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash, role FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(credentials) = credentials else {
            let candidate = password.to_string();
            tokio::task::spawn_blocking(move || password::verify_dummy(&candidate)).await??;
            warn!("Login attempt for unknown user");
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };

        let candidate = password.to_string();
        let stored = credentials.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || password::verify_password(&candidate, &stored)).await??;
        if !matches {
            warn!("Login attempt with wrong password for user {}", credentials.id);
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        Ok(Identity {
            user_id: credentials.id,
            role: credentials.role,
        })
    }

    /// Read a profile. Callers may read themselves; admins may read anyone.
    pub async fn get(&self, user_id: i64, caller: &Identity) -> Result<User, ServiceError> {
        ensure_self_or_admin(user_id, caller)?;
        sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {user_id} not found")))
    }

    /// Change name, email and optionally password. Never touches the role.
    pub async fn edit(&self, user_id: i64, caller: &Identity, update: UserUpdate) -> Result<User, ServiceError> {
        ensure_self_or_admin(user_id, caller)?;
        let (name, email) = validate_profile(&update.name, &update.email)?;

        let password_hash = match update.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_blocking(password).await?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = $2, email = $3, password_hash = COALESCE($4, password_hash)
             WHERE id = $1
             RETURNING id, name, email, role",
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .conflict_on_unique(DUPLICATE_USER)?
        .ok_or_else(|| ServiceError::not_found(format!("user {user_id} not found")))?;

        info!("User {} updated by {}", user.id, caller.user_id);
        Ok(user)
    }

    /// Admin listing. `role` matches users holding any of the given bits.
    pub async fn list(&self, filter: UserFilter, page: Pagination) -> Result<Vec<User>, ServiceError> {
        let pattern = like_pattern(filter.search.as_deref());
        let role = filter.role.filter(|r| *r != Role::ANY).map(i16::from);

        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role FROM users
             WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1)
               AND ($2::SMALLINT IS NULL OR (role & $2) <> 0)
             ORDER BY id
             LIMIT $3 OFFSET $4",
        )
        .bind(pattern)
        .bind(role)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Create the configured administrator unless a user with that name exists.
    pub async fn ensure_default_admin(&self, bootstrap: &BootstrapConfig) -> Result<(), ServiceError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE name = $1)")
            .bind(&bootstrap.admin_name)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            return Ok(());
        }

        let password_hash = hash_blocking(bootstrap.admin_password.clone()).await?;
        let inserted = sqlx::query(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(&bootstrap.admin_name)
        .bind(&bootstrap.admin_email)
        .bind(password_hash)
        .bind(i16::from(Role::ADMIN))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Seeded default administrator '{}'", bootstrap.admin_name);
        }
        Ok(())
    }
}

async fn hash_blocking(password: String) -> Result<String, ServiceError> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password)).await??;
    Ok(hash)
}

fn ensure_self_or_admin(user_id: i64, caller: &Identity) -> Result<(), ServiceError> {
    if caller.user_id == user_id || caller.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("you may only access your own profile"))
    }
}

fn validate_profile<'a>(name: &'a str, email: &'a str) -> Result<(&'a str, &'a str), ServiceError> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("name is required"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::invalid("a valid email is required"));
    }
    Ok((name, email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_or_admin_gate() {
        let customer = Identity { user_id: 3, role: Role::CUSTOMER };
        let admin = Identity { user_id: 1, role: Role::ADMIN };
        assert!(ensure_self_or_admin(3, &customer).is_ok());
        assert!(ensure_self_or_admin(1, &admin).is_ok());
        assert!(ensure_self_or_admin(3, &admin).is_ok());
        assert!(matches!(
            ensure_self_or_admin(4, &customer),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn profile_validation() {
        assert_eq!(validate_profile(" ann ", "a@b.c").unwrap(), ("ann", "a@b.c"));
        assert!(validate_profile("", "a@b.c").is_err());
        assert!(validate_profile("ann", "not-an-email").is_err());
    }
}
