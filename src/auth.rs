//! Token models issued by the HMRC token endpoint and the secret wrapper that keeps them out of
//! logs.

pub mod token;

pub use token::{access::*, secret::*};
