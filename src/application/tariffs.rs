use super::cache::ReadThroughCache;
use super::cache_keys;
use crate::domain::ports::{CacheHandle, TariffStoreHandle};
use crate::domain::tariff::{TariffFilter, TariffRate};
use crate::error::Result;
use tracing::debug;

/// Cache-backed lookup of tariff templates.
#[derive(Clone)]
pub struct TariffResolver {
    store: TariffStoreHandle,
    cache: ReadThroughCache,
}

impl TariffResolver {
    /// Creates a resolver over `store`. Resolutions stay cached until the
    /// entry is explicitly deleted.
    pub fn new(store: TariffStoreHandle, cache: CacheHandle) -> Self {
        Self {
            store,
            cache: ReadThroughCache::new(cache),
        }
    }

    /// Templates applicable to `filter`. An empty list means "no applicable
    /// tier"; a store failure after a cache miss is an error, never a partial result.
    pub async fn resolve(&self, filter: &TariffFilter) -> Result<Vec<TariffRate>> {
        let key = cache_keys::tariff_rates(filter)?;
        debug!(%key, region = filter.region(), "resolving tariff rates");
        self.cache
            .get_or_load(&key, || self.store.find(filter))
            .await
    }
}
