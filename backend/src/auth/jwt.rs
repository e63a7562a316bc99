//! Signed token (JWT) issuance, validation and renewal
//!
//! Tokens are self-contained: the server keeps no state and re-verifies the
//! signature and validity window on every request.

use super::strategy::{bearer_token, CredentialStrategy, IssuedCredential};
use super::AuthUser;
use crate::config::{AuthConfig, AuthStrategyKind};
use crate::error::{ApiError, ApiResult};
use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use recipes_api_shared::AuthError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not valid before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Token lifetimes
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Lifetime of tokens issued on signup and signin
    pub token_ttl_secs: i64,
    /// Lifetime of tokens issued by refresh
    pub refresh_ttl_secs: i64,
    /// Maximum remaining validity at which a token may be refreshed
    pub refresh_window_secs: i64,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service for token operations
///
/// Without a secret the service has no keys: issuing fails and every
/// validation is rejected.
#[derive(Clone)]
pub struct JwtService {
    keys: Option<JwtKeys>,
    config: JwtConfig,
}

impl JwtService {
    /// Create a new JWT service with pre-computed keys
    ///
    /// Call this once at application startup and store in AppState.
    pub fn new(secret: &str, config: JwtConfig) -> Self {
        let keys = (!secret.is_empty()).then(|| JwtKeys::new(secret));
        Self { keys, config }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            JwtConfig {
                token_ttl_secs: config.token_ttl_secs,
                refresh_ttl_secs: config.refresh_ttl_secs,
                refresh_window_secs: config.refresh_window_secs,
            },
        )
    }

    /// Whether a signing secret is configured
    pub fn has_secret(&self) -> bool {
        self.keys.is_some()
    }

    /// Generate a token for a fresh signin
    #[inline]
    pub fn generate_token(&self, username: &str) -> Result<SignedToken> {
        self.generate_token_at(username, Utc::now(), self.config.token_ttl_secs)
    }

    /// Generate a token issued at `issued_at` and valid for `ttl_secs`
    pub fn generate_token_at(
        &self,
        username: &str,
        issued_at: DateTime<Utc>,
        ttl_secs: i64,
    ) -> Result<SignedToken> {
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("JWT secret is not configured"))?;

        let expires_at = issued_at + Duration::seconds(ttl_secs);
        let claims = Claims {
            username: username.to_string(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, keys.encoding())
            .map_err(|e| anyhow::anyhow!("Failed to generate token: {}", e))?;

        Ok(SignedToken {
            token,
            // Report the expiry the token actually carries (whole seconds)
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Validate a token and return claims
    ///
    /// Signature, `nbf` and `exp` are all checked with zero leeway.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::InvalidCredential)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        decode::<Claims>(token, keys.decoding(), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    debug!(error = %e, "Rejected signed token");
                    AuthError::InvalidCredential
                }
            })
    }

    /// Refresh is only allowed once the token is close to expiry
    pub fn check_refresh_window(&self, claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthError> {
        let remaining = claims.exp - now.timestamp();
        if remaining > self.config.refresh_window_secs {
            return Err(AuthError::RefreshTooEarly);
        }
        Ok(())
    }

    /// Validate `token` and mint its successor
    pub fn refresh_token(&self, token: &str) -> ApiResult<SignedToken> {
        let claims = self.validate_token(token)?;
        let now = Utc::now();
        self.check_refresh_window(&claims, now)?;

        self.generate_token_at(&claims.username, now, self.config.refresh_ttl_secs)
            .map_err(ApiError::Internal)
    }

    /// Get the config (for sharing)
    pub fn jwt_config(&self) -> &JwtConfig {
        &self.config
    }
}

impl From<SignedToken> for IssuedCredential {
    fn from(token: SignedToken) -> Self {
        IssuedCredential {
            token: Some(token.token),
            expires: token.expires_at,
            set_cookie: None,
        }
    }
}

#[async_trait]
impl CredentialStrategy for JwtService {
    fn kind(&self) -> AuthStrategyKind {
        AuthStrategyKind::Signed
    }

    async fn issue(&self, username: &str) -> ApiResult<IssuedCredential> {
        let token = self.generate_token(username).map_err(ApiError::Internal)?;
        Ok(token.into())
    }

    async fn authenticate(&self, headers: &HeaderMap) -> ApiResult<AuthUser> {
        let token = bearer_token(headers)?;
        let claims = self.validate_token(token)?;
        Ok(AuthUser {
            username: claims.username,
        })
    }

    async fn refresh(&self, headers: &HeaderMap) -> ApiResult<IssuedCredential> {
        let token = bearer_token(headers)?;
        Ok(self.refresh_token(token)?.into())
    }
}
