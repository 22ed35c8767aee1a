use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{CacheKey, InventoryCache, is_fresh};
use crate::error::CoreError;
use crate::inventory::Inventory;

/// In-process cache; lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, (DateTime<Utc>, Inventory)>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    /// `ttl` of `None` keeps entries forever.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InventoryCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Inventory>, CoreError> {
        let Some(entry) = self.entries.get(key.as_str()) else {
            return Ok(None);
        };
        let (stored_at, inventory) = entry.value();
        if is_fresh(*stored_at, self.ttl, Utc::now()) {
            return Ok(Some(inventory.clone()));
        }
        drop(entry);
        self.entries.remove(key.as_str());
        Ok(None)
    }

    fn put(&self, key: &CacheKey, inventory: &Inventory) -> Result<(), CoreError> {
        self.entries
            .insert(key.as_str().to_owned(), (Utc::now(), inventory.clone()));
        Ok(())
    }
}
