use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::text_enum;
use crate::auth::Role;

text_enum!(
    RequestStatus, "request status" {
        Pending => "pending",
        Granted => "granted",
        Rejected => "rejected",
    }
);

text_enum!(
    /// Whether the requesting user has acknowledged the outcome.
    SeenStatus, "seen status" {
        Seen => "seen",
        Unseen => "unseen",
    }
);

/// A user's request to be elevated to `role`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRequest {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "i16")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    #[sqlx(try_from = "String")]
    pub user_status: SeenStatus,
    pub granted_by: Option<i64>,
}
