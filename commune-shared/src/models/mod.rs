//! Database models for Commune
//!
//! All models follow the same shape: a row struct deriving `sqlx::FromRow`,
//! a `Create*` input struct, and associated functions taking a `&PgPool`.
//!
//! # Models
//!
//! - `user`: User accounts
//! - `community`: Communities and slug derivation
//! - `role`: Roles, including the well-known authority roles
//! - `member`: The (community, user, role) binding

pub mod community;
pub mod member;
pub mod role;
pub mod user;
