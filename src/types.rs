/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::services::ServiceError;

/// Whose rows an operation may touch.
///
/// Admins act `Unrestricted`; everyone else is confined to rows they own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    OwnedBy(i64),
    Unrestricted,
}

impl Scope {
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_admin() {
            Scope::Unrestricted
        } else {
            Scope::OwnedBy(identity.user_id)
        }
    }

    /// Owner filter to bind into `($n::BIGINT IS NULL OR owner_column = $n)`.
    pub fn owner(self) -> Option<i64> {
        match self {
            Scope::OwnedBy(id) => Some(id),
            Scope::Unrestricted => None,
        }
    }
}

/// Raw `limit`/`offset` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(
        params: PageParams,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<Self, ServiceError> {
        let limit = params.limit.unwrap_or(default_limit);
        if limit < 1 || limit > max_limit {
            return Err(ServiceError::invalid(format!(
                "limit must be between 1 and {max_limit}"
            )));
        }
        let offset = params.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ServiceError::invalid("offset must not be negative"));
        }
        Ok(Self { limit, offset })
    }
}

/// Listing payload: the page plus the window that produced it.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}
