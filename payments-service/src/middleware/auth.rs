//! Bearer-credential resolution.
//!
//! The identity provider issues HS256 JWTs carrying the user id in `sub`
//! and, when the account has one, the user's email. This extractor is the
//! only place a credential is turned into a user; handlers never touch the
//! raw token.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use platform_core::error::AppError;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::startup::AppState;

/// Claims the identity provider places in its access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

/// Authenticated caller resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

impl AuthUser {
    /// Email is required for payment initiation (checkout pre-fill); absence
    /// is treated the same as a failed credential.
    pub fn require_email(&self) -> Result<&str, AppError> {
        self.email.as_deref().ok_or_else(|| {
            AppError::Unauthenticated(anyhow::anyhow!(
                "User not authenticated or email not available"
            ))
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated(anyhow::anyhow!("No authorization header provided"))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthenticated(anyhow::anyhow!("Authorization header is not a bearer token"))
        })?;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.auth.jwt_secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)?;

        let span = tracing::Span::current();
        span.record("user_id", claims.sub.as_str());

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
