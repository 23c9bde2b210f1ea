//! The two ways services use the shared cache.
//!
//! [`ReadThroughCache`] fronts reference data: misses load from the store and
//! populate the cache, failures of the cache itself only degrade latency.
//! [`WriteThroughCache`] holds keys that writers refresh or delete on every
//! mutation; there a failed cache write means readers may see stale data, so
//! it is reported to the caller.

use crate::domain::ports::CacheHandle;
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::warn;

/// Populated entries carry no TTL; they live until someone deletes them.
#[derive(Clone)]
pub struct ReadThroughCache {
    inner: CacheHandle,
}

impl ReadThroughCache {
    /// Wraps `inner`; population failures are logged and swallowed.
    pub fn new(inner: CacheHandle) -> Self {
        Self { inner }
    }

    /// Returns the cached value for `key`, or runs `load` and stores its result.
    ///
    /// A failing `load` is returned as is and nothing is cached.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = cached(&self.inner, key).await {
            return Ok(hit);
        }

        let value = load().await?;

        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                if let Err(e) = self.inner.set(key, bytes, None).await {
                    warn!(%key, error = %e, "failed to populate cache");
                }
            }
            Err(e) => warn!(%key, error = %e, "failed to encode cache entry"),
        }

        Ok(value)
    }
}

#[derive(Clone)]
pub struct WriteThroughCache {
    inner: CacheHandle,
}

impl WriteThroughCache {
    /// Wraps `inner`; refresh and invalidate failures are returned to the caller.
    pub fn new(inner: CacheHandle) -> Self {
        Self { inner }
    }

    /// Unreadable entries count as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        cached(&self.inner, key).await
    }

    /// Stores `value` until the next refresh or invalidation.
    pub async fn refresh<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.inner.set(key, bytes, None).await
    }

    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }
}

async fn cached<T: DeserializeOwned>(cache: &CacheHandle, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "discarding undecodable cache entry");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(%key, error = %e, "cache read failed, falling back to store");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BillingError;
    use crate::infrastructure::in_memory::InMemoryCache;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_read_through_loads_once() {
        let cache = ReadThroughCache::new(Arc::new(InMemoryCache::new()));
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<u32> = cache
                .get_or_load("k", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BillingError>(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_through_does_not_cache_failures() {
        let cache = ReadThroughCache::new(Arc::new(InMemoryCache::new()));

        let failed: Result<u32> = cache
            .get_or_load("k", || async {
                Err::<u32, _>(BillingError::store("tariffs", "down"))
            })
            .await;
        assert!(failed.is_err());

        let loaded: u32 = cache.get_or_load("k", || async { Ok::<_, BillingError>(7) }).await.unwrap();
        assert_eq!(loaded, 7);
    }

    #[tokio::test]
    async fn test_write_through_refresh_and_invalidate() {
        let cache = WriteThroughCache::new(Arc::new(InMemoryCache::new()));
        cache.refresh("k", &"v".to_string()).await.unwrap();
        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));

        cache.invalidate("k").await.unwrap();
        assert_eq!(cache.get::<String>("k").await, None);
    }
}
