//! User service for signup, signin and credential lifecycle
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - Credential strategies are built once at startup and shared

use crate::auth::{CredentialStrategy, IssuedCredential, PasswordService};
use crate::error::ApiError;
use crate::repositories::UserStore;
use axum::http::HeaderMap;
use recipes_api_shared::{AuthError, CredentialsRequest};
use tracing::{debug, info};

/// User service for authentication operations
pub struct UserService;

impl UserService {
    /// Register a new user and issue their first credential
    ///
    /// # Performance
    /// Password hashing is offloaded to blocking thread pool via `spawn_blocking`.
    pub async fn signup(
        users: &dyn UserStore,
        passwords: &PasswordService,
        auth: &dyn CredentialStrategy,
        request: CredentialsRequest,
    ) -> Result<IssuedCredential, ApiError> {
        request.validate().map_err(ApiError::Validation)?;
        passwords
            .check_length(&request.password)
            .map_err(ApiError::Validation)?;

        // Cheap early exit; the unique constraint still decides races
        if users.username_exists(&request.username).await? {
            return Err(ApiError::Conflict("Username already taken".to_string()));
        }

        // A hashing failure aborts before anything is written
        let password_hash = passwords
            .hash_async(request.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = users.create(&request.username, &password_hash).await?;
        info!(username = %user.username, "User registered");
        metrics::counter!("recipes_signups_total").increment(1);

        auth.issue(&user.username).await
    }

    /// Check a username and password and issue a fresh credential
    ///
    /// Unknown users and wrong passwords fail identically.
    ///
    /// # Performance
    /// Password verification is offloaded to blocking thread pool.
    pub async fn signin(
        users: &dyn UserStore,
        passwords: &PasswordService,
        auth: &dyn CredentialStrategy,
        request: CredentialsRequest,
    ) -> Result<IssuedCredential, ApiError> {
        request.validate().map_err(ApiError::Validation)?;

        let valid = match users.find_by_username(&request.username).await? {
            Some(user) => passwords
                .verify_async(request.password, user.password_hash)
                .await
                .map_err(ApiError::Internal)?,
            None => {
                passwords
                    .verify_dummy_async(request.password)
                    .await
                    .map_err(ApiError::Internal)?;
                false
            }
        };

        if !valid {
            debug!(username = %request.username, "Sign-in refused");
            metrics::counter!("recipes_signin_failures_total").increment(1);
            return Err(AuthError::InvalidCredentials.into());
        }

        info!(username = %request.username, "User signed in");
        auth.issue(&request.username).await
    }

    /// Exchange the presented credential for a successor
    pub async fn refresh(
        auth: &dyn CredentialStrategy,
        headers: &HeaderMap,
    ) -> Result<IssuedCredential, ApiError> {
        auth.refresh(headers).await
    }

    /// Revoke the presented credential
    ///
    /// Returns the `Set-Cookie` value that clears it on the client.
    pub async fn sign_out(
        auth: &dyn CredentialStrategy,
        headers: &HeaderMap,
    ) -> Result<String, ApiError> {
        auth.sign_out(headers).await
    }
}
