//! Utility modules for the session layer.

pub mod errors;
pub mod logger;

pub use errors::{Result, SessionError};
