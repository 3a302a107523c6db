// handlers/token.rs - POST /api/token

use axum::{extract::State, http::HeaderValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::auth::{IssuedToken, Role};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: i64,
    pub role: Role,
}

/// Exchange a username and password for a signed token.
///
/// The token is returned in the body and also set as an HttpOnly cookie so
/// browser clients authenticate without handling it.
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> ApiResult<TokenResponse> {
    let identity = state
        .users()
        .verify_credentials(&body.username, &body.password)
        .await?;

    let issued = state
        .jwt
        .issue(identity.user_id, identity.role)
        .map_err(ServiceError::from)?;
    state
        .token_cache
        .put(&issued.token, identity.user_id, identity.role, issued.expires_at);

    let cookie = auth_cookie(&state.config, &issued)?;
    tracing::info!("Issued token for user {}", identity.user_id);

    Ok(ApiResponse::created(TokenResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user_id: identity.user_id,
        role: identity.role,
    })
    .with_cookie(cookie))
}

fn auth_cookie(config: &AppConfig, issued: &IssuedToken) -> Result<HeaderValue, ApiError> {
    let max_age = (issued.expires_at - Utc::now()).num_seconds().max(0);
    let secure = if config.is_development() { "" } else { "; Secure" };
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}{}",
        config.security.auth_cookie_name, issued.token, max_age, secure
    );
    HeaderValue::from_str(&cookie).map_err(|e| {
        tracing::error!("Could not build auth cookie: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}
