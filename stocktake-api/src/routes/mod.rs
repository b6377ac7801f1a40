/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `organization`: Organization membership endpoints
/// - `scan`: AI image scanning

pub mod health;
pub mod organization;
pub mod scan;
