//! Password hashing
//!
//! Provides secure password hashing and verification with a configurable
//! algorithm and work factor.
//!
//! # Performance Considerations
//!
//! Both argon2 and bcrypt are intentionally CPU-intensive. Async callers
//! should use `hash_async` / `verify_async`, which run on the blocking pool.

use crate::config::{PasswordAlgorithm, PasswordConfig};
use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::error;

/// bcrypt only reads this many bytes of input
pub const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing service
///
/// New hashes use the configured algorithm. Verification picks the
/// algorithm from the stored digest, so existing hashes keep working after
/// the configuration changes.
#[derive(Clone)]
pub struct PasswordService {
    algorithm: PasswordAlgorithm,
    bcrypt_cost: u32,
    argon2_params: Params,
    /// Hash of a random password, verified against when the user is unknown
    dummy_hash: Arc<str>,
}

impl PasswordService {
    /// Create a password service from configuration
    ///
    /// Computes one hash up front, so call this once at startup.
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let argon2_params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;

        if !(4..=31).contains(&config.bcrypt_cost) {
            anyhow::bail!("bcrypt cost must be between 4 and 31");
        }

        let mut service = Self {
            algorithm: config.algorithm,
            bcrypt_cost: config.bcrypt_cost,
            argon2_params,
            dummy_hash: Arc::from(""),
        };
        let filler = SecretString::new(uuid::Uuid::new_v4().to_string());
        service.dummy_hash = Arc::from(service.hash(&filler)?);

        Ok(service)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.argon2_params.clone())
    }

    /// Reject a password the configured algorithm cannot hash faithfully
    pub fn check_length(&self, password: &SecretString) -> std::result::Result<(), String> {
        match self.algorithm {
            PasswordAlgorithm::Bcrypt
                if password.expose_secret().len() > BCRYPT_MAX_PASSWORD_BYTES =>
            {
                Err(format!(
                    "Password must be at most {} bytes",
                    BCRYPT_MAX_PASSWORD_BYTES
                ))
            }
            _ => Ok(()),
        }
    }

    /// Hash a password (blocking operation)
    pub fn hash(&self, password: &SecretString) -> Result<String> {
        self.check_length(password).map_err(anyhow::Error::msg)?;
        let plaintext = password.expose_secret().as_bytes();
        match self.algorithm {
            PasswordAlgorithm::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = self
                    .argon2()
                    .hash_password(plaintext, &salt)
                    .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
                Ok(hash.to_string())
            }
            PasswordAlgorithm::Bcrypt => bcrypt::hash(plaintext, self.bcrypt_cost)
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e)),
        }
    }

    /// Hash a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool,
    /// preventing it from blocking the async runtime.
    pub async fn hash_async(&self, password: SecretString) -> Result<String> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored digest (blocking operation)
    ///
    /// A digest in an unknown or corrupt format never verifies.
    pub fn verify(&self, password: &SecretString, hash: &str) -> bool {
        let plaintext = password.expose_secret().as_bytes();

        if hash.starts_with("$argon2") {
            match PasswordHash::new(hash) {
                Ok(parsed) => self.argon2().verify_password(plaintext, &parsed).is_ok(),
                Err(e) => {
                    error!("Stored argon2 hash is malformed: {}", e);
                    false
                }
            }
        } else if hash.starts_with("$2") {
            // Longer input would be truncated and match its own prefix
            if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
                return false;
            }
            bcrypt::verify(plaintext, hash).unwrap_or_else(|e| {
                error!("Stored bcrypt hash is malformed: {}", e);
                false
            })
        } else {
            error!("Stored password hash has an unrecognised format");
            false
        }
    }

    /// Verify a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool.
    pub async fn verify_async(&self, password: SecretString, hash: String) -> Result<bool> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }

    /// Burn the same work as a real verification, for unknown users
    pub async fn verify_dummy_async(&self, password: SecretString) -> Result<()> {
        let hash = self.dummy_hash.to_string();
        self.verify_async(password, hash).await.map(|_| ())
    }
}
