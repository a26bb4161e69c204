//! Token → identity cache on top of a `CacheClient`.
use sha2::{Digest, Sha256};
use std::{sync::Arc, time::Duration};

use crate::config::TokenKeyMode;
use crate::services::auth::identity::{Claim, IdentityRecord};
use crate::services::cache::{CacheClient, CacheError};

/// Caches introspection results per bearer token.
///
/// Reads never fail: backend errors and undecodable entries both come back as
/// a miss (the latter is also evicted).
#[derive(Clone)]
pub struct TokenCache {
    cache: Arc<dyn CacheClient>,
    // Namespace shared with other keys in the same backend, e.g. "patient-api:"
    prefix: String,
    key_mode: TokenKeyMode,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("backend", &self.cache.backend_name())
            .field("prefix", &self.prefix)
            .field("key_mode", &self.key_mode)
            .finish()
    }
}

impl TokenCache {
    pub fn new(cache: Arc<dyn CacheClient>, prefix: impl Into<String>, key_mode: TokenKeyMode) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            key_mode,
        }
    }

    pub fn key(&self, token: &str) -> String {
        match self.key_mode {
            TokenKeyMode::Hashed => format!("{}token:{}", self.prefix, sha256_hex(token)),
            TokenKeyMode::Raw => format!("{}{}", self.prefix, token),
        }
    }

    pub async fn get(&self, token: &str) -> Option<IdentityRecord> {
        let key = self.key(token);

        let raw = match self.cache.get_string(&key).await {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    backend = self.cache.backend_name(),
                    token = %token_fingerprint(token),
                    "token cache read failed; treating as miss"
                );
                return None;
            }
        };

        let decoded = serde_json::from_str::<Vec<Claim>>(&raw)
            .map_err(|e| e.to_string())
            .and_then(|claims| IdentityRecord::from_claims(claims).map_err(|e| e.to_string()));

        match decoded {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    token = %token_fingerprint(token),
                    "corrupt token cache entry; will re-introspect"
                );
                if let Err(err) = self.cache.del(&key).await {
                    tracing::debug!(error = %err, "failed to evict corrupt token cache entry");
                }
                None
            }
        }
    }

    pub async fn put(
        &self,
        token: &str,
        identity: &IdentityRecord,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_string(&identity.to_claims())
            .map_err(|e| CacheError::InvalidValue(e.to_string()))?;

        self.cache.set_with_ttl(&self.key(token), &value, ttl).await
    }
}

/// Short, non-reversible token id for log correlation.
pub fn token_fingerprint(token: &str) -> String {
    let mut hex = sha256_hex(token);
    hex.truncate(12);
    hex
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;

    fn cache(mode: TokenKeyMode) -> (MemoryCache, TokenCache) {
        let backend = MemoryCache::new();
        let cache = TokenCache::new(Arc::new(backend.clone()), "test:", mode);
        (backend, cache)
    }

    #[test]
    fn hashed_keys_do_not_contain_the_token() {
        let (_, cache) = cache(TokenKeyMode::Hashed);
        let key = cache.key("secret-token");

        assert!(key.starts_with("test:token:"));
        assert!(!key.contains("secret-token"));
        assert_eq!(key.len(), "test:token:".len() + 64);
    }

    #[test]
    fn raw_keys_use_the_token_verbatim() {
        let (_, cache) = cache(TokenKeyMode::Raw);
        assert_eq!(cache.key("abc"), "test:abc");
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        assert_eq!(token_fingerprint("abc"), token_fingerprint("abc"));
        assert_ne!(token_fingerprint("abc"), token_fingerprint("abd"));
        assert_eq!(token_fingerprint("abc").len(), 12);
    }

    #[tokio::test]
    async fn put_then_get_returns_identity() {
        let (_, cache) = cache(TokenKeyMode::Hashed);
        let identity = IdentityRecord::new(Some("bob".into()), vec!["viewer".into()], None);

        cache
            .put("t1", &identity, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(cache.get("t1").await, Some(identity));
        assert_eq!(cache.get("t2").await, None);
    }

    #[tokio::test]
    async fn stored_value_is_a_claim_array() {
        let (backend, cache) = cache(TokenKeyMode::Raw);
        let identity = IdentityRecord::new(None, vec!["admin".into()], None);
        cache.put("t1", &identity, Duration::from_secs(30)).await.unwrap();

        let raw = backend.get_string("test:t1").await.unwrap().unwrap();
        assert_eq!(raw, r#"[{"type":"role","value":"admin"}]"#);
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss_and_is_evicted() {
        let (backend, cache) = cache(TokenKeyMode::Hashed);
        let key = cache.key("t1");
        backend
            .set_with_ttl(&key, "{not json", Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(cache.get("t1").await, None);
        assert_eq!(backend.get_string(&key).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_with_its_ttl() {
        let (_, cache) = cache(TokenKeyMode::Hashed);
        let identity = IdentityRecord::new(None, vec!["viewer".into()], None);
        cache.put("t1", &identity, Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("t1").await, None);
    }
}
