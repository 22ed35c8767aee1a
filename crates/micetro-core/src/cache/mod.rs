// ── Inventory cache ──
//
// The engine trusts a cache entry completely or not at all: a hit is
// returned verbatim, anything else triggers a full rebuild.

mod file;
mod key;
mod memory;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::inventory::Inventory;

pub use file::JsonFileCache;
pub use key::{CACHE_SCHEMA_VERSION, CacheKey, PLUGIN_NAME};
pub use memory::MemoryCache;

/// Storage for finished inventories.
///
/// Implementations own their consistency and expiry rules. `get` returns
/// `Ok(None)` for a missing or expired entry.
pub trait InventoryCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Inventory>, CoreError>;
    fn put(&self, key: &CacheKey, inventory: &Inventory) -> Result<(), CoreError>;
}

/// How [`load_or_build`] treats the cache for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve a fresh entry if present, otherwise rebuild and store.
    #[default]
    Use,
    /// Always rebuild, then store the result.
    Refresh,
    /// Never read or write the cache.
    Disabled,
}

/// Return the cached inventory for `key`, or run `build` and store what it
/// produces.
///
/// A cache read error is treated as a miss and a store failure is only
/// logged; neither fails the run. Errors from `build` propagate and
/// nothing is stored.
pub async fn load_or_build<F, Fut>(
    cache: Option<&dyn InventoryCache>,
    key: &CacheKey,
    policy: CachePolicy,
    build: F,
) -> Result<Inventory, CoreError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Inventory, CoreError>>,
{
    let Some(cache) = cache.filter(|_| policy != CachePolicy::Disabled) else {
        return build().await;
    };

    if policy == CachePolicy::Use {
        match cache.get(key) {
            Ok(Some(inventory)) => {
                debug!(%key, "inventory served from cache");
                return Ok(inventory);
            }
            Ok(None) => debug!(%key, "cache miss"),
            Err(err) => warn!(%key, error = %err, "cache read failed, rebuilding"),
        }
    }

    let inventory = build().await?;
    if let Err(err) = cache.put(key, &inventory) {
        warn!(%key, error = %err, "failed to store inventory in cache");
    }
    Ok(inventory)
}

/// `true` while an entry stored at `stored_at` is within `ttl` of `now`.
/// Entries stamped in the future count as fresh.
pub(crate) fn is_fresh(stored_at: DateTime<Utc>, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
    let Some(ttl) = ttl else {
        return true;
    };
    !(now - stored_at).to_std().is_ok_and(|age| age > ttl)
}
