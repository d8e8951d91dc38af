// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha512;
// self
use crate::{error::OtpError, otp::SharedSecret};

/// Hash construction used by [`OtpGenerator`](crate::otp::OtpGenerator).
///
/// Implementors decide how the shared secret becomes an HMAC key (key stretching or raw
/// bytes) and which keyed hash produces the digest that is truncated into a code.
pub trait OtpHasher
where
	Self: Send + Sync,
{
	/// Derives the HMAC key from the shared secret.
	fn hash_key(&self, secret: &SharedSecret) -> Vec<u8>;

	/// Computes the keyed hash of `message`.
	fn compute_hash(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, OtpError>;
}

/// HMAC-SHA-512 with the secret repeated up to the 64-byte SHA-512 block size.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacSha512Hasher;
impl HmacSha512Hasher {
	/// Key length the secret is stretched to.
	pub const KEY_LENGTH: usize = 64;
}
impl OtpHasher for HmacSha512Hasher {
	fn hash_key(&self, secret: &SharedSecret) -> Vec<u8> {
		secret.key_of_length(Self::KEY_LENGTH)
	}

	fn compute_hash(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, OtpError> {
		hmac_sha512(key, message)
	}
}

/// HMAC-SHA-512 keyed with the raw secret bytes.
///
/// This is the variant the token endpoint expects for its rotating client credential.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnpaddedHmacSha512Hasher;
impl OtpHasher for UnpaddedHmacSha512Hasher {
	fn hash_key(&self, secret: &SharedSecret) -> Vec<u8> {
		secret.as_bytes().to_vec()
	}

	fn compute_hash(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, OtpError> {
		hmac_sha512(key, message)
	}
}

fn hmac_sha512(key: &[u8], message: &[u8]) -> Result<Vec<u8>, OtpError> {
	let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key)
		.map_err(|e| OtpError::malformed(format!("HMAC key was rejected ({e})")))?;

	mac.update(message);

	Ok(mac.finalize().into_bytes().to_vec())
}
