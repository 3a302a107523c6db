use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::Role;

/// Public view of an account. The password hash never leaves the user service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "i16")]
    pub role: Role,
}

/// Row used only when checking a login.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub password_hash: String,
    #[sqlx(try_from = "i16")]
    pub role: Role,
}
