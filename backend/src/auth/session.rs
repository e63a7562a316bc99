//! Server-side session credentials
//!
//! The client holds only an opaque session id in an `HttpOnly` cookie. The
//! session store maps that id to the username and the opaque token
//! currently bound to it.

use super::strategy::{CredentialStrategy, IssuedCredential};
use super::AuthUser;
use crate::config::{AuthConfig, AuthStrategyKind};
use crate::error::ApiResult;
use crate::repositories::{SessionRecord, SessionStore, StoreResult};
use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use recipes_api_shared::AuthError;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Cookie attributes for the session reference
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
}

impl SessionCookie {
    /// Check that `name` is a cookie-name token
    pub fn validate_name(name: &str) -> Result<(), String> {
        let is_token_char = |c: char| {
            c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
        };
        if name.is_empty() || !name.chars().all(is_token_char) {
            return Err(format!("Invalid session cookie name: {:?}", name));
        }
        Ok(())
    }

    /// `Set-Cookie` value binding `session_id` for `max_age_secs`
    pub fn build(&self, session_id: &str, max_age_secs: i64) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
            self.name,
            session_id,
            max_age_secs.max(0),
            self.secure_attr()
        )
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn build_clear(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}",
            self.name,
            self.secure_attr()
        )
    }

    /// Session id from the request's `Cookie` header
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let cookie_header = headers.get(COOKIE)?.to_str().ok()?;

        cookie_header
            .split(';')
            .filter_map(|cookie| cookie.trim().split_once('='))
            .find(|(name, _)| name.trim() == self.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn secure_attr(&self) -> &'static str {
        if self.secure {
            "; Secure"
        } else {
            ""
        }
    }
}

/// 256 bits from two v4 UUIDs
fn random_id() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Session credential strategy
#[derive(Clone)]
pub struct SessionStrategy {
    store: Arc<dyn SessionStore>,
    cookie: SessionCookie,
    ttl_secs: i64,
}

impl SessionStrategy {
    pub fn new(store: Arc<dyn SessionStore>, cookie: SessionCookie, ttl_secs: i64) -> Self {
        Self {
            store,
            cookie,
            ttl_secs,
        }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, config: &AuthConfig) -> Self {
        Self::new(
            store,
            SessionCookie {
                name: config.session_cookie_name.clone(),
                secure: config.cookie_secure,
            },
            config.token_ttl_secs,
        )
    }

    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// Bind a fresh token to `session_id` and persist it
    async fn bind(&self, session_id: &str, username: &str) -> StoreResult<IssuedCredential> {
        let expires_at = Utc::now() + Duration::seconds(self.ttl_secs);
        let record = SessionRecord {
            username: username.to_string(),
            token: Some(random_id()),
            expires_at,
        };

        let ttl = std::time::Duration::from_secs(self.ttl_secs.max(1) as u64);
        self.store.save(session_id, &record, ttl).await?;

        Ok(IssuedCredential {
            token: None,
            expires: expires_at,
            set_cookie: Some(self.cookie.build(session_id, self.ttl_secs)),
        })
    }

    /// Resolve the request's session, enforcing a bound token and expiry
    ///
    /// Expired sessions are deleted on sight.
    async fn resolve(&self, headers: &HeaderMap) -> ApiResult<(String, SessionRecord)> {
        let session_id = self
            .cookie
            .extract(headers)
            .ok_or(AuthError::MissingCredential)?;

        let record = self
            .store
            .load(&session_id)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        self.check_active(&session_id, &record, Utc::now()).await?;
        Ok((session_id, record))
    }

    async fn check_active(
        &self,
        session_id: &str,
        record: &SessionRecord,
        now: DateTime<Utc>,
    ) -> ApiResult<()> {
        if record.token.is_none() {
            return Err(AuthError::InvalidCredential.into());
        }
        if !record.is_active_at(now) {
            debug!(username = %record.username, "Dropping expired session");
            self.store.delete(session_id).await?;
            return Err(AuthError::Expired.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStrategy for SessionStrategy {
    fn kind(&self) -> AuthStrategyKind {
        AuthStrategyKind::Session
    }

    async fn issue(&self, username: &str) -> ApiResult<IssuedCredential> {
        // A new id on every signin, never reusing one the client presented
        let session_id = random_id();
        let credential = self.bind(&session_id, username).await?;
        info!(username = %username, "Session started");
        Ok(credential)
    }

    async fn authenticate(&self, headers: &HeaderMap) -> ApiResult<AuthUser> {
        let (_, record) = self.resolve(headers).await?;
        Ok(AuthUser {
            username: record.username,
        })
    }

    async fn refresh(&self, headers: &HeaderMap) -> ApiResult<IssuedCredential> {
        let (session_id, record) = self.resolve(headers).await?;
        Ok(self.bind(&session_id, &record.username).await?)
    }

    async fn sign_out(&self, headers: &HeaderMap) -> ApiResult<String> {
        let (session_id, record) = self.resolve(headers).await?;
        self.store.delete(&session_id).await?;
        info!(username = %record.username, "Session ended");
        Ok(self.cookie.build_clear())
    }
}
