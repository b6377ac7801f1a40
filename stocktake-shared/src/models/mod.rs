//! Database models for Stocktake
//!
//! # Models
//!
//! - `organization`: Organizations and their invite codes
//! - `membership`: User-organization relationships with roles
//! - `detected_item`: Transient output of an AI image scan

pub mod detected_item;
pub mod membership;
pub mod organization;
