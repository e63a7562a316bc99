//! Input validation functions
//!
//! This module provides validation utilities for user input.
//! Uses both custom validators and the `validator` crate for derive macros.

/// Maximum username length
pub const MAX_USERNAME_LEN: usize = 64;

/// Maximum password length (bytes)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Validate username format
///
/// Usernames are the identity key, so they are restricted to a small,
/// unambiguous alphabet.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err("Username too long".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(
            "Username may only contain letters, digits, '_', '.' and '-'".to_string(),
        );
    }
    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate a search tag
pub fn validate_tag(tag: &str) -> Result<(), String> {
    if tag.trim().is_empty() {
        return Err("Tag cannot be empty".to_string());
    }
    if tag.len() > 100 {
        return Err("Tag too long".to_string());
    }
    Ok(())
}
