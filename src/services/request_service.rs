use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::auth::{Identity, Role};
use crate::database::models::{RequestStatus, RoleRequest, SeenStatus};
use crate::services::error::{DbResultExt, ServiceError};
use crate::types::Pagination;

const REQUEST_COLUMNS: &str = "id, user_id, role, status, user_status, granted_by";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub user_id: Option<i64>,
    pub role: Option<Role>,
    pub status: Option<RequestStatus>,
    pub user_status: Option<SeenStatus>,
}

/// Admin verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Grant,
    Reject,
}

impl Decision {
    fn status(self) -> RequestStatus {
        match self {
            Decision::Grant => RequestStatus::Granted,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

pub struct RequestService {
    pool: PgPool,
}

impl RequestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, role: Role) -> Result<RoleRequest, ServiceError> {
        if role == Role::ANY {
            return Err(ServiceError::invalid("requested role must be customer, chef or admin"));
        }

        let sql = format!(
            "INSERT INTO requests (user_id, role) VALUES ($1, $2) RETURNING {REQUEST_COLUMNS}"
        );
        let request = sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(user_id)
            .bind(i16::from(role))
            .fetch_one(&self.pool)
            .await
            .invalid_on_reference("user does not exist")?;

        info!("User {} requested role {}", request.user_id, request.role);
        Ok(request)
    }

    /// List requests. Non-admins only see their own, and only unseen ones
    /// unless they ask for a specific seen state.
    pub async fn list(
        &self,
        filter: RequestFilter,
        caller: &Identity,
        page: Pagination,
    ) -> Result<Vec<RoleRequest>, ServiceError> {
        let filter = scope_filter(filter, caller)?;

        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM requests
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::SMALLINT IS NULL OR role = $2)
               AND ($3::TEXT IS NULL OR status = $3)
               AND ($4::TEXT IS NULL OR user_status = $4)
             ORDER BY id DESC
             LIMIT $5 OFFSET $6"
        );
        let requests = sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(filter.user_id)
            .bind(filter.role.map(i16::from))
            .bind(filter.status.map(RequestStatus::as_str))
            .bind(filter.user_status.map(SeenStatus::as_str))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    /// Grant or reject a pending request, recording the deciding admin.
    ///
    /// Granting replaces the user's role with the requested one in the same
    /// transaction. Roles are not OR-ed together, since customer plus chef
    /// bits would equal admin.
    /// The outcome is flagged unseen so the requester is shown it.
    pub async fn decide(
        &self,
        request_id: i64,
        decision: Decision,
        admin_id: i64,
    ) -> Result<RoleRequest, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE requests
             SET status = $2, granted_by = $3, user_status = 'unseen'
             WHERE id = $1 AND status = 'pending'
             RETURNING {REQUEST_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(request_id)
            .bind(decision.status().as_str())
            .bind(admin_id)
            .fetch_optional(&mut *tx)
            .await?;

        let request = match updated {
            Some(request) => request,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM requests WHERE id = $1)")
                        .bind(request_id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    ServiceError::conflict(format!("request {request_id} has already been decided"))
                } else {
                    ServiceError::not_found(format!("request {request_id} not found"))
                });
            }
        };

        if decision == Decision::Grant {
            sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
                .bind(request.user_id)
                .bind(i16::from(request.role))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(
            "Request {} {} by admin {} (user {}, role {})",
            request.id, request.status, admin_id, request.user_id, request.role
        );
        Ok(request)
    }

    /// Acknowledge the outcome of one's own request.
    pub async fn mark_seen(&self, request_id: i64, user_id: i64) -> Result<RoleRequest, ServiceError> {
        let sql = format!(
            "UPDATE requests SET user_status = 'seen'
             WHERE id = $1 AND user_id = $2
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, RoleRequest>(&sql)
            .bind(request_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("request {request_id} not found")))
    }
}

/// Apply the caller's visibility to a requested filter.
fn scope_filter(mut filter: RequestFilter, caller: &Identity) -> Result<RequestFilter, ServiceError> {
    // Role 0 matches nothing, so it means "any role".
    filter.role = filter.role.filter(|r| *r != Role::ANY);
    if caller.is_admin() {
        return Ok(filter);
    }
    if let Some(requested) = filter.user_id {
        if requested != caller.user_id {
            return Err(ServiceError::forbidden("cannot list another user's requests"));
        }
    }
    filter.user_id = Some(caller.user_id);
    filter.user_status.get_or_insert(SeenStatus::Unseen);
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: i64) -> Identity {
        Identity { user_id: id, role: Role::CUSTOMER }
    }

    #[test]
    fn non_admin_is_pinned_to_own_unseen_requests() {
        let filter = scope_filter(RequestFilter::default(), &customer(5)).unwrap();
        assert_eq!(filter.user_id, Some(5));
        assert_eq!(filter.user_status, Some(SeenStatus::Unseen));
    }

    #[test]
    fn any_role_is_no_role_filter() {
        let admin = Identity { user_id: 1, role: Role::ADMIN };
        let filter = RequestFilter {
            role: Some(Role::ANY),
            ..Default::default()
        };
        assert_eq!(scope_filter(filter, &admin).unwrap().role, None);

        let filter = RequestFilter {
            role: Some(Role::CHEF),
            ..Default::default()
        };
        assert_eq!(scope_filter(filter, &customer(5)).unwrap().role, Some(Role::CHEF));
    }

    #[test]
    fn non_admin_may_ask_for_seen_requests() {
        let filter = RequestFilter {
            user_status: Some(SeenStatus::Seen),
            ..Default::default()
        };
        let filter = scope_filter(filter, &customer(5)).unwrap();
        assert_eq!(filter.user_status, Some(SeenStatus::Seen));
    }

    #[test]
    fn non_admin_cannot_list_someone_else() {
        let filter = RequestFilter {
            user_id: Some(6),
            ..Default::default()
        };
        assert!(matches!(
            scope_filter(filter, &customer(5)),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_filter_is_untouched() {
        let admin = Identity { user_id: 1, role: Role::ADMIN };
        let filter = scope_filter(RequestFilter::default(), &admin).unwrap();
        assert_eq!(filter.user_id, None);
        assert_eq!(filter.user_status, None);
    }
}
