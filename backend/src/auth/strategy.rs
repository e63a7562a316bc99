//! Credential strategy
//!
//! One deployment runs exactly one strategy, chosen from `auth.strategy`.
//! Handlers and the auth gate only ever see `dyn CredentialStrategy`.

use super::{AuthUser, JwtService, SessionCookie, SessionStrategy};
use crate::config::{AuthConfig, AuthStrategyKind};
use crate::error::{ApiError, ApiResult};
use crate::repositories::SessionStore;
use async_trait::async_trait;
use axum::{
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use recipes_api_shared::{AuthError, AuthResponse};
use std::sync::Arc;
use tracing::error;

/// A credential handed to the client on signup, signin or refresh
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// Token returned in the body (signed strategy)
    pub token: Option<String>,
    pub expires: DateTime<Utc>,
    /// `Set-Cookie` value carrying the session reference (session strategy)
    pub set_cookie: Option<String>,
}

impl IssuedCredential {
    pub fn body(&self) -> AuthResponse {
        AuthResponse {
            token: self.token.clone(),
            expires: self.expires,
        }
    }
}

impl IntoResponse for IssuedCredential {
    fn into_response(self) -> Response {
        let mut response = Json(self.body()).into_response();
        if let Some(cookie) = self.set_cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().insert(SET_COOKIE, value);
                }
                Err(e) => {
                    error!("Session cookie is not a valid header value: {}", e);
                    return ApiError::Internal(anyhow::anyhow!("Failed to set session cookie"))
                        .into_response();
                }
            }
        }
        response
    }
}

/// Issue, check, renew and revoke credentials
#[async_trait]
pub trait CredentialStrategy: Send + Sync {
    fn kind(&self) -> AuthStrategyKind;

    /// Mint a credential for a user who just proved their identity
    async fn issue(&self, username: &str) -> ApiResult<IssuedCredential>;

    /// Identify the caller from the request headers
    async fn authenticate(&self, headers: &HeaderMap) -> ApiResult<AuthUser>;

    /// Exchange the presented credential for a successor
    async fn refresh(&self, headers: &HeaderMap) -> ApiResult<IssuedCredential>;

    /// Revoke the presented credential, returning a `Set-Cookie` that clears it
    async fn sign_out(&self, _headers: &HeaderMap) -> ApiResult<String> {
        Err(AuthError::SignOutUnsupported.into())
    }
}

/// Build the configured strategy
///
/// The session strategy needs a session store; the signed strategy ignores it.
pub fn build_strategy(
    config: &AuthConfig,
    sessions: Option<Arc<dyn SessionStore>>,
) -> anyhow::Result<Arc<dyn CredentialStrategy>> {
    match config.strategy {
        AuthStrategyKind::Signed => Ok(Arc::new(JwtService::from_config(config))),
        AuthStrategyKind::Session => {
            let store = sessions.ok_or_else(|| {
                anyhow::anyhow!("The session strategy requires a session store")
            })?;
            SessionCookie::validate_name(&config.session_cookie_name)
                .map_err(anyhow::Error::msg)?;
            Ok(Arc::new(SessionStrategy::from_config(store, config)))
        }
    }
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidCredential)
}
