//! # Commune Shared Library
//!
//! This crate contains the types, persistence layer, and domain logic shared
//! by the Commune API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, communities, roles, members)
//! - `auth`: Tokens, password hashing, identity resolution, and the
//!   membership authority
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Commune shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
