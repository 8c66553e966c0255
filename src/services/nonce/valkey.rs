use std::{sync::Arc, time::Duration};

use tracing::warn;

use crate::services::{
    cache::{CacheClient, ValkeyClient},
    nonce::store::{BoxFuture, NonceError, NonceResult, NonceStatus, NonceStore, generate_token},
};

// Stored value layout: `live:<return_path>` until consumed, then the tombstone.
const LIVE_PREFIX: &str = "live:";
const TOMBSTONE: &str = "consumed";

// Fresh draws before giving up on SET NX; a second collision means something is broken.
const ISSUE_ATTEMPTS: usize = 3;

/// Valkey-backed nonce store (Redis protocol) for multi-process hosts.
///
/// The backend owns expiry (`EX`), so an expired nonce reads as `Unknown`.
/// Any backend error is returned as `Err` (fail-closed).
#[derive(Clone)]
pub struct ValkeyNonceStore<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions across environments.
    prefix: String,
    ttl: Duration,
}

impl ValkeyNonceStore<ValkeyClient> {
    pub async fn connect(redis_url: &str, ttl: Duration) -> NonceResult<Self> {
        let client = ValkeyClient::connect(redis_url).await?;
        Ok(Self::new_with_cache(Arc::new(client), "sso:nonce", ttl))
    }
}

impl<C: CacheClient> ValkeyNonceStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn key(&self, nonce: &str) -> String {
        format!("{}:{}", self.prefix, nonce)
    }
}

impl<C: CacheClient> NonceStore for ValkeyNonceStore<C> {
    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    fn issue<'a>(&'a self, return_path: &'a str) -> BoxFuture<'a, NonceResult<String>> {
        Box::pin(async move {
            let value = format!("{LIVE_PREFIX}{return_path}");

            for _ in 0..ISSUE_ATTEMPTS {
                let nonce = generate_token()?;
                if self
                    .cache
                    .set_if_absent_with_ttl(&self.key(&nonce), &value, self.ttl)
                    .await?
                {
                    return Ok(nonce);
                }
            }

            warn!(
                backend = self.cache.backend_name(),
                "repeated nonce collisions"
            );
            Err(NonceError::Entropy)
        })
    }

    fn status<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<NonceStatus>> {
        Box::pin(async move {
            let stored = self.cache.get_string(&self.key(nonce)).await?;

            Ok(match stored {
                None => NonceStatus::Unknown,
                Some(v) => match v.strip_prefix(LIVE_PREFIX) {
                    Some(return_path) => NonceStatus::Live {
                        return_path: return_path.to_string(),
                    },
                    None => NonceStatus::Consumed,
                },
            })
        })
    }

    fn consume<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<bool>> {
        Box::pin(async move {
            let previous = self
                .cache
                .replace_keep_ttl(&self.key(nonce), TOMBSTONE)
                .await?;

            Ok(previous.is_some_and(|v| v.starts_with(LIVE_PREFIX)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::{CacheError, CacheResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // In-process stand-in honouring the command semantics (TTL aside).
    #[derive(Clone, Default)]
    struct FakeCache {
        entries: Arc<Mutex<HashMap<String, (String, Duration)>>>,
        broken: bool,
    }

    impl FakeCache {
        fn check(&self) -> CacheResult<()> {
            if self.broken {
                Err(CacheError::BackendConnection("connection refused".into()))
            } else {
                Ok(())
            }
        }

        fn evict(&self, key: &str) {
            self.entries.lock().unwrap().remove(key);
        }

        fn ttl_of(&self, key: &str) -> Option<Duration> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }
    }

    #[async_trait]
    impl CacheClient for FakeCache {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
            self.check()?;
            Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        async fn set_if_absent_with_ttl(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> CacheResult<bool> {
            self.check()?;
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(key) {
                return Ok(false);
            }
            entries.insert(key.to_string(), (value.to_string(), ttl));
            Ok(true)
        }

        async fn replace_keep_ttl(&self, key: &str, value: &str) -> CacheResult<Option<String>> {
            self.check()?;
            let mut entries = self.entries.lock().unwrap();
            Ok(entries
                .get_mut(key)
                .map(|(v, _)| std::mem::replace(v, value.to_string())))
        }
    }

    fn store(cache: FakeCache) -> ValkeyNonceStore<FakeCache> {
        ValkeyNonceStore::new_with_cache(Arc::new(cache), "test:sso", Duration::from_secs(600))
    }

    #[tokio::test]
    async fn issue_records_live_nonce_with_ttl_and_return_path() {
        let cache = FakeCache::default();
        let store = store(cache.clone());

        let nonce = store.issue("/latest").await.unwrap();

        assert_eq!(
            cache.ttl_of(&format!("test:sso:{nonce}")),
            Some(Duration::from_secs(600))
        );
        assert!(store.is_valid(&nonce).await.unwrap());
        assert_eq!(
            store.return_path(&nonce).await.unwrap().as_deref(),
            Some("/latest")
        );
    }

    #[tokio::test]
    async fn consume_leaves_tombstone() {
        let store = store(FakeCache::default());
        let nonce = store.generate().await.unwrap();

        assert!(store.consume(&nonce).await.unwrap());
        assert!(!store.consume(&nonce).await.unwrap());
        assert_eq!(store.status(&nonce).await.unwrap(), NonceStatus::Consumed);
    }

    #[tokio::test]
    async fn evicted_nonce_reads_unknown_and_cannot_be_consumed() {
        let cache = FakeCache::default();
        let store = store(cache.clone());
        let nonce = store.generate().await.unwrap();

        cache.evict(&store.key(&nonce));

        assert_eq!(store.status(&nonce).await.unwrap(), NonceStatus::Unknown);
        assert!(!store.consume(&nonce).await.unwrap());
        assert_eq!(cache.ttl_of(&store.key(&nonce)), None);
    }

    #[tokio::test]
    async fn backend_failure_fails_closed() {
        let store = store(FakeCache {
            broken: true,
            ..FakeCache::default()
        });

        assert!(matches!(
            store.generate().await,
            Err(NonceError::Backend(_))
        ));
        assert!(matches!(
            store.is_valid("abc").await,
            Err(NonceError::Backend(_))
        ));
    }
}
