//! Process-local token cache keyed by `agent + scope`.

// self
use crate::{_prelude::*, token::BearerToken};

/// Cached bearer token together with its absolute expiry instant.
#[derive(Clone, Debug)]
pub struct CachedToken {
	/// Scheme-prefixed token value.
	pub token: BearerToken,
	/// Instant after which the entry is treated as absent.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Returns `true` once the entry has passed its expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

/// Thread-safe in-memory cache mapping `agent + scope` keys to live tokens.
///
/// Entries are only ever inserted; a refresh overwrites the entry for the same
/// key and expired entries are dropped on lookup. The cache does not serialize
/// refreshes—the handler's refresh critical section owns that responsibility.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(Arc<RwLock<HashMap<String, CachedToken>>>);
impl TokenCache {
	/// Returns the live entry for `key`, evicting it when expired.
	pub fn try_get(&self, key: &str) -> Option<BearerToken> {
		let now = OffsetDateTime::now_utc();

		{
			let entries = self.0.read();

			match entries.get(key) {
				Some(entry) if !entry.is_expired_at(now) => return Some(entry.token.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut entries = self.0.write();

		// Re-check under the write lock so a concurrent refresh is never evicted.
		if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
			entries.remove(key);
		}

		None
	}

	/// Inserts or replaces the entry for `key` with `expires_at = now + ttl`.
	pub fn add(&self, key: impl Into<String>, token: BearerToken, ttl: Duration) {
		let entry = CachedToken { token, expires_at: OffsetDateTime::now_utc() + ttl };

		self.0.write().insert(key.into(), entry);
	}
}
