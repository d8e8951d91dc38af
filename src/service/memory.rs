//! Thread-safe in-memory [`SecretRepository`] for local development and tests.

// self
use crate::{
	_prelude::*,
	error::SecretError,
	service::{SecretRepository, ServiceFuture},
};

type SecretMap = Arc<RwLock<HashMap<String, String>>>;

/// Secret store that keeps values in-process.
///
/// Clones share the same map, so a test can rotate a secret while the broker holds a clone.
#[derive(Clone, Debug, Default)]
pub struct MemorySecretRepository(SecretMap);
impl MemorySecretRepository {
	/// Creates an empty repository.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a secret while building the repository.
	pub fn with_secret(self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(name, value);

		self
	}

	/// Inserts or replaces a secret.
	pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
		self.0.write().insert(name.into(), value.into());
	}

	/// Removes a secret, returning its previous value.
	pub fn remove(&self, name: &str) -> Option<String> {
		self.0.write().remove(name)
	}

	fn secret_now(map: &SecretMap, name: &str) -> Result<String, SecretError> {
		map.read().get(name).cloned().ok_or_else(|| SecretError::Missing { name: name.to_owned() })
	}
}
impl SecretRepository for MemorySecretRepository {
	fn secret<'a>(&'a self, name: &'a str) -> ServiceFuture<'a, String> {
		let map = self.0.clone();

		Box::pin(async move { Self::secret_now(&map, name).map_err(Error::from) })
	}
}
