//! Business operations built on the storage interface
//!
//! - `organization`: organization creation, joining, leaving and management

pub mod organization;

pub use organization::{LeaveOutcome, OrganizationDetails, OrganizationError, OrganizationResult};
