// JSON file cache backend.
//
// One file per key under a directory. Writes go to a sibling temp file
// and are renamed into place so readers never see a torn entry.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CacheKey, InventoryCache, is_fresh};
use crate::error::CoreError;
use crate::inventory::Inventory;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    stored_at: DateTime<Utc>,
    inventory: T,
}

#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
    prefix: String,
    ttl: Option<Duration>,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}_{key}.json", self.prefix))
    }
}

impl InventoryCache for JsonFileCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Inventory>, CoreError> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CoreError::CacheIo { path, source }),
        };

        let envelope: CacheEnvelope<Inventory> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring undecodable cache entry");
                return Ok(None);
            }
        };

        if is_fresh(envelope.stored_at, self.ttl, Utc::now()) {
            Ok(Some(envelope.inventory))
        } else {
            debug!(path = %path.display(), stored_at = %envelope.stored_at, "cache entry expired");
            Ok(None)
        }
    }

    fn put(&self, key: &CacheKey, inventory: &Inventory) -> Result<(), CoreError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CoreError::CacheIo { path, source }
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let body = serde_json::to_vec(&CacheEnvelope {
            stored_at: Utc::now(),
            inventory,
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, &path).map_err(io_err(&path))?;
        debug!(path = %path.display(), "cache entry stored");
        Ok(())
    }
}
