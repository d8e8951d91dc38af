//! Time-based one-time password generation used as the token endpoint's rotating client
//! credential.
//!
//! [`TotpGenerator`] follows the RFC 6238 construction (time step → 8-byte big-endian counter →
//! HMAC → dynamic truncation) with two deliberate extension points exposed through
//! [`OtpHasher`]: the hash function and the step that turns the shared secret into the HMAC
//! key. [`HmacSha512Hasher`] stretches short secrets to the SHA-512 block size by repetition,
//! while [`UnpaddedHmacSha512Hasher`] keys the HMAC with the raw secret bytes.

mod generator;
mod hasher;
mod secret;
mod settings;

pub use generator::*;
pub use hasher::*;
pub use secret::*;
pub use settings::*;
