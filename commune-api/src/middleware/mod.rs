//! Middleware for the API server
//!
//! - `auth`: Bearer-credential guard that attaches the acting user
//! - `rate_limit`: Per-client rolling-window request limiting

pub mod auth;
pub mod rate_limit;
