//! Database layer for Stocktake
//!
//! # Modules
//!
//! - `pool`: PostgreSQL connection pool with health check
//! - `migrations`: Embedded migration runner
//!
//! Query functions live on the models; the [`crate::store`] module wraps them
//! behind the storage interface the services use.

pub mod migrations;
pub mod pool;
