//! Authentication module
//!
//! Password hashing plus two interchangeable credential strategies: a
//! server-side session and a self-contained signed token.

mod jwt;
mod middleware;
mod password;
mod session;
mod strategy;

pub use jwt::{Claims, JwtConfig, JwtService, SignedToken};
pub use middleware::{auth_middleware, AuthUser};
pub use password::PasswordService;
pub use session::{SessionCookie, SessionStrategy};
pub use strategy::{bearer_token, build_strategy, CredentialStrategy, IssuedCredential};
