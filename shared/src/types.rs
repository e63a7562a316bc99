//! API request and response types

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{validate_password, validate_username};

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

// ============================================================================
// Authentication Types
// ============================================================================

/// Signup / signin request
///
/// The password is kept in a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: SecretString,
}

impl CredentialsRequest {
    /// Check the shape of the credentials, returning the first problem found
    pub fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_username(&self.username)?;
        validate_password(self.password.expose_secret())
    }
}

/// Issued credential
///
/// `token` is only present for signed credentials; session credentials
/// travel in a cookie and the body carries just the expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub expires: DateTime<Utc>,
}

/// Authenticated user response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Recipe Types
// ============================================================================

/// Create / update recipe request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecipeRequest {
    #[validate(length(min = 1, max = 200, message = "Recipe name must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// Query string for tag search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub tag: Option<String>,
}
