pub mod auth;
pub mod authorize;
pub mod response;

pub use auth::{authenticate, extract_token, AuthOutcome, Authenticator};
pub use authorize::{authorize, gated, require_role};
pub use response::{ApiResponse, ApiResult};
