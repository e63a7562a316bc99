//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the cache and the credential strategy.

pub mod recipe;
pub mod user;

pub use recipe::RecipeService;
pub use user::UserService;
