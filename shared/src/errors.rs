//! Error types for the Recipes application

use thiserror::Error;

/// Reasons a credential can be refused
///
/// Messages are deliberately generic: callers must not be able to tell an
/// unknown username from a wrong password, or a forged token from an
/// expired one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential has expired")]
    Expired,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Missing credential")]
    MissingCredential,

    #[error("Token is not yet eligible for refresh")]
    RefreshTooEarly,

    #[error("Sign-out is only supported for session credentials")]
    SignOutUnsupported,
}

impl AuthError {
    /// Whether this is a client-side misuse rather than a failed proof of identity
    pub fn is_bad_request(&self) -> bool {
        matches!(self, AuthError::RefreshTooEarly | AuthError::SignOutUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_not_bad_requests() {
        assert!(!AuthError::InvalidCredentials.is_bad_request());
        assert!(!AuthError::Expired.is_bad_request());
        assert!(!AuthError::MissingCredential.is_bad_request());
        assert!(AuthError::RefreshTooEarly.is_bad_request());
        assert!(AuthError::SignOutUnsupported.is_bad_request());
    }
}
