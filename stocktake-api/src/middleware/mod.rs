/// Middleware modules for the API server
///
/// Authentication lives in [`crate::app`]; this module holds the
/// response-shaping layers.

pub mod security;
