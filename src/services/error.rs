use thiserror::Error;

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::database::models::UnknownVariant;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Outcome of a failed lifecycle operation.
///
/// `NotFound` deliberately covers "exists but is not yours" for orders, order
/// items and payments, so callers cannot discover other customers' records.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    fn pg_code(&self) -> Option<String> {
        match self {
            ServiceError::Database(err) => err
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned()),
            _ => None,
        }
    }
}

impl From<UnknownVariant> for ServiceError {
    fn from(err: UnknownVariant) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Internal(format!("blocking task failed: {err}"))
    }
}

/// Translate Postgres constraint violations raised by guarded writes.
pub trait DbResultExt<T> {
    /// Unique violations become `Conflict(message)`.
    fn conflict_on_unique(self, message: &str) -> Result<T, ServiceError>;

    /// Foreign key and check violations become `InvalidInput(message)`.
    fn invalid_on_reference(self, message: &str) -> Result<T, ServiceError>;
}

impl<T, E: Into<ServiceError>> DbResultExt<T> for Result<T, E> {
    fn conflict_on_unique(self, message: &str) -> Result<T, ServiceError> {
        self.map_err(|err| {
            let err = err.into();
            match err.pg_code().as_deref() {
                Some(UNIQUE_VIOLATION) => ServiceError::conflict(message),
                _ => err,
            }
        })
    }

    fn invalid_on_reference(self, message: &str) -> Result<T, ServiceError> {
        self.map_err(|err| {
            let err = err.into();
            match err.pg_code().as_deref() {
                Some(FOREIGN_KEY_VIOLATION) | Some(CHECK_VIOLATION) => ServiceError::invalid(message),
                _ => err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_pass_through() {
        let result: Result<(), ServiceError> = Err(ServiceError::not_found("order 1 not found"));
        let err = result.conflict_on_unique("dup").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn row_not_found_is_not_a_constraint() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result
            .conflict_on_unique("dup")
            .invalid_on_reference("bad ref")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Database(sqlx::Error::RowNotFound)));
    }
}
