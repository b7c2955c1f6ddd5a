//! Authentication and authorization for Commune
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`jwt`]: Signed, time-limited bearer tokens
//! - [`middleware`]: Resolution of a bearer credential to a stored user
//! - [`authorization`]: The membership authority — who may add or remove a
//!   community member

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
