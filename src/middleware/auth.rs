use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use crate::api::AppState;
use crate::auth::{Identity, JwtError, JwtService, TokenCache};
use crate::error::ApiError;

/// Terminal states of authenticating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No credential was presented. Downstream gates treat this as role `ANY`.
    Anonymous,
    FromCache(Identity),
    Verified(Identity),
}

impl AuthOutcome {
    pub fn identity(self) -> Option<Identity> {
        match self {
            AuthOutcome::Anonymous => None,
            AuthOutcome::FromCache(identity) | AuthOutcome::Verified(identity) => Some(identity),
        }
    }
}

/// Resolves a bearer token to an identity: cache first, then signature check.
pub struct Authenticator<'a> {
    jwt: &'a JwtService,
    cache: &'a TokenCache,
}

impl<'a> Authenticator<'a> {
    pub fn new(jwt: &'a JwtService, cache: &'a TokenCache) -> Self {
        Self { jwt, cache }
    }

    /// A successful verification is cached until the token's own expiry.
    pub fn resolve(&self, token: Option<&str>) -> Result<AuthOutcome, JwtError> {
        let Some(token) = token else {
            return Ok(AuthOutcome::Anonymous);
        };

        if let Some(cached) = self.cache.get(token) {
            return Ok(AuthOutcome::FromCache(cached.into()));
        }

        let verified = self.jwt.verify(token)?;
        self.cache.put(
            token,
            verified.identity.user_id,
            verified.identity.role,
            verified.expires_at,
        );
        Ok(AuthOutcome::Verified(verified.identity))
    }
}

/// Attach the caller's identity, if any, to the request extensions.
///
/// A presented but invalid token stops the request with 401. A token whose
/// signature is valid but whose claims cannot be read is a server fault (500).
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.config.security.auth_cookie_name);
    let outcome = Authenticator::new(&state.jwt, &state.token_cache)
        .resolve(token.as_deref())
        .map_err(|err| {
            if err.is_credential_error() {
                warn!("Rejected bearer token: {}", err);
                ApiError::unauthorized("invalid or expired token")
            } else {
                error!("Token passed signature check but could not be read: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        })?;

    if let Some(identity) = outcome.identity() {
        request.extensions_mut().insert(identity);
    }
    Ok(next.run(request).await)
}

/// Bearer token from the Authorization header, falling back to the auth cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}
