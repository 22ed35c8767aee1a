use std::fmt;

use sha2::{Digest, Sha256};

/// Bump when the cached [`Inventory`](crate::Inventory) layout changes;
/// entries written under an older version are never read again.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Name the cache key is scoped under.
pub const PLUGIN_NAME: &str = "micetro_inventory";

/// Cache key derived from the configuration source path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// `micetro_inventory_v<N>_<h1>s_<h2>`, where `h1` and `h2` are short
    /// SHA-256 digests of the plugin name and `source`.
    pub fn for_source(source: &str) -> Self {
        Self(format!(
            "{PLUGIN_NAME}_v{CACHE_SCHEMA_VERSION}_{}s_{}",
            short_digest(PLUGIN_NAME),
            short_digest(source)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn short_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex: String = digest.iter().take(3).map(|b| format!("{b:02x}")).collect();
    hex.truncate(5);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_shape() {
        let key = CacheKey::for_source("/etc/ansible/micetro.yml");
        let rest = key
            .as_str()
            .strip_prefix("micetro_inventory_v1_")
            .expect("prefix");
        let (h1, h2) = rest.split_once("s_").expect("separator");
        assert_eq!(h1.len(), 5);
        assert_eq!(h2.len(), 5);
        assert!(rest.chars().all(|c| c.is_ascii_hexdigit() || c == 's' || c == '_'));
    }

    #[test]
    fn key_depends_only_on_the_source() {
        assert_eq!(
            CacheKey::for_source("@micetro_inventory"),
            CacheKey::for_source("@micetro_inventory")
        );
        assert_ne!(
            CacheKey::for_source("/a/micetro.yml"),
            CacheKey::for_source("/b/micetro.yml")
        );
    }
}
