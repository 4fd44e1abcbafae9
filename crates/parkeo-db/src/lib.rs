//! Parkeo Database Layer
//!
//! This crate provides PostgreSQL database access and repository
//! implementations for the Parkeo engine. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for stays, tariffs, payments, memberships
//!   and operators
//! - The transactional guarantees the core contracts require: entry
//!   uniqueness via a partial unique index, and exit finalization as a
//!   single transaction covering the stay update and the payment insert

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use parkeo_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
