//! Access token value types.

pub mod access;
pub mod secret;
