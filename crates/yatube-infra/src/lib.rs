//! # Yatube Infrastructure
//!
//! Concrete implementations of the ports defined in `yatube-core`:
//! repositories, page cache, image storage and authentication.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory storage only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod cache;
pub mod database;
pub mod media;

#[cfg(feature = "auth")]
pub mod auth;

pub use cache::InMemoryCache;
pub use database::InMemoryStore;
pub use media::LocalImageStore;

#[cfg(feature = "postgres")]
pub use database::DatabaseConnections;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
