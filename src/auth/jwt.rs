use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Identity, Role};

/// Claims carried by every bearer token this service signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: u8,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret must not be empty")]
    InvalidSecret,

    #[error("unsupported signing algorithm {0:?}; only HMAC algorithms are accepted")]
    UnsupportedAlgorithm(Algorithm),

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The signature checked out but the payload does not have the expected shape.
    #[error("token claims are malformed: {0}")]
    MalformedClaims(String),

    #[error("token generation failed: {0}")]
    Generation(String),
}

impl JwtError {
    /// Failures the caller can fix by presenting a different credential.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            JwtError::Expired | JwtError::InvalidSignature | JwtError::InvalidToken(_)
        )
    }
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with a single server-held HMAC secret.
pub struct JwtService {
    algorithm: Algorithm,
    issuer: String,
    expiry: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        issuer: impl Into<String>,
        expiry: Duration,
    ) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(JwtError::UnsupportedAlgorithm(algorithm));
        }

        Ok(Self {
            algorithm,
            issuer: issuer.into(),
            expiry,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue(&self, user_id: i64, role: Role) -> Result<IssuedToken, JwtError> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Sign a token as if issued at `now`.
    pub fn issue_at(
        &self,
        user_id: i64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = now + self.expiry;
        let claims = Claims {
            user_id,
            role: role.bits(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Generation(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, algorithm, issuer and time bounds, then extract the identity.
    ///
    /// Verification runs against a loosely typed payload first so that a token
    /// with a valid signature but an unexpected claim shape is reported as
    /// [`JwtError::MalformedClaims`] rather than as a bad credential.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = vec![self.algorithm];
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let payload = decode::<serde_json::Value>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })?
            .claims;

        let claims: Claims = serde_json::from_value(payload)
            .map_err(|e| JwtError::MalformedClaims(e.to_string()))?;

        let role = Role::from_bits(claims.role)
            .ok_or_else(|| JwtError::MalformedClaims(format!("unknown role {}", claims.role)))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| JwtError::MalformedClaims(format!("exp out of range: {}", claims.exp)))?;

        Ok(VerifiedToken {
            identity: Identity {
                user_id: claims.user_id,
                role,
            },
            expires_at,
        })
    }
}
