pub mod jwt;
pub mod password;
pub mod role;
pub mod token_cache;

pub use jwt::{Claims, IssuedToken, JwtError, JwtService, VerifiedToken};
pub use role::Role;
pub use token_cache::{CachedIdentity, TokenCache};

use serde::Serialize;

/// Who is making the request, as established by the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<CachedIdentity> for Identity {
    fn from(cached: CachedIdentity) -> Self {
        Identity {
            user_id: cached.user_id,
            role: cached.role,
        }
    }
}
