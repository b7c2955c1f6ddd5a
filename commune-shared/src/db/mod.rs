//! Database layer for Commune
//!
//! - `pool`: PostgreSQL connection pool management with a startup health check
//! - `migrations`: sqlx migration runner (schema lives in `migrations/` at the
//!   workspace root)
//!
//! Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;
