use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{error::AppError, models::Role};

/// Claims
///
/// The payload signed into every session token. Nothing about a session is
/// persisted; identity and role are rebuilt from these claims on each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    /// Issued At (seconds since the Unix epoch).
    pub iat: i64,
    /// Expiration Time (seconds since the Unix epoch).
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token lifetime overflows the calendar")]
    ExpiryOverflow,
    #[error("token could not be signed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// A freshly signed token together with the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// TokenManager
///
/// Issues and validates HS256 session tokens. The signing secret is handed in at
/// construction so that each manager (and each test) owns its own key material.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenManager {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue_token(&self, user_id: i64, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_token_at(user_id, role, Utc::now())
    }

    /// Signs a token as if it had been issued at `issued_at`.
    pub fn issue_token_at(
        &self,
        user_id: i64,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOverflow)?;
        let claims = Claims {
            user_id,
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// validate_token
    ///
    /// Verifies the signature against the current secret, then decodes the claims.
    /// Expiry is checked twice: the library runs with zero leeway, and the decoded
    /// `exp` is compared against the clock here as well so that an expired token
    /// can never be accepted through a library default.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers use it to stamp
/// ownership on new posts and to run the owner-or-admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            role: claims.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Reads `Authorization: Bearer <token>` and validates the token with the
/// application's `TokenManager`. Any failure rejects the request with a 401
/// envelope before the handler runs.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenManager: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenManager::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Authentication("Authorization header missing".to_string()))?
            .to_str()
            .map_err(|_| {
                AppError::Authentication("Invalid Authorization header format".to_string())
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Authentication("Invalid Authorization header format".to_string())
            })?;

        match tokens.validate_token(token) {
            Ok(claims) => Ok(AuthUser::from(claims)),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Err(AppError::Authentication(format!("Invalid token: {e}")))
            }
        }
    }
}
