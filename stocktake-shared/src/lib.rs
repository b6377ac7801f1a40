//! # Stocktake Shared Library
//!
//! Domain types and business logic used by the Stocktake API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Token validation and role policy
//! - `db`: Connection pool and migrations
//! - `invite_code`: Organization invite code generation
//! - `store`: Storage interface with PostgreSQL and in-memory backends
//! - `services`: Organization membership operations
//! - `vision`: Vision model client and response normalizer

pub mod auth;
pub mod db;
pub mod invite_code;
pub mod models;
pub mod services;
pub mod store;
pub mod vision;

/// Current version of the Stocktake shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
