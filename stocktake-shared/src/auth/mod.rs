//! Authentication and authorization utilities
//!
//! # Modules
//!
//! - [`jwt`]: Bearer token validation (HS256)
//! - [`middleware`]: Request authentication producing an [`middleware::AuthContext`]
//! - [`authorization`]: Role policy for organization management

pub mod authorization;
pub mod jwt;
pub mod middleware;
