//! Inventory source configuration.
//!
//! A run is configured either by a YAML/JSON file (`micetro.yml`,
//! `micetro_inv.yaml`, ...) or, when the source path is the
//! `@micetro_inventory` sentinel, purely from `MM_*` environment variables.
//! Translation into `micetro_api` / `micetro_core` runtime types lives here
//! too so the binary stays thin.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Yaml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use micetro_api::{Connection, RetryPolicy, TlsMode, TransportConfig};
use micetro_core::{
    CacheKey, FilterMode, FilterSet, GroupNaming, InventoryCache, InventoryOptions, JsonFileCache,
    MemoryCache,
};

/// Source path that selects environment-only configuration.
pub const ENV_SENTINEL: &str = "@micetro_inventory";

/// Value the `plugin` key of a configuration file must carry.
pub const PLUGIN_ID: &str = "ansilabnl.micetro.inventory";

/// Accepted configuration file stems.
pub const VALID_STEMS: &[&str] = &["micetro", "micetro_inv", "micetro_inventory"];

const VALID_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

pub const ENV_HOST: &str = "MM_HOST";
pub const ENV_USER: &str = "MM_USER";
pub const ENV_PASSWORD: &str = "MM_PASSWORD";
pub const ENV_RANGES: &str = "MM_RANGES";
pub const ENV_FILTERS: &str = "MM_FILTERS";

/// Prefix for tuning overrides (`MICETRO_PAGE_SIZE`, `MICETRO_CACHE__ENABLED`).
pub const ENV_TUNING_PREFIX: &str = "MICETRO_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported inventory source '{path}': {reason}")]
    UnsupportedSource { path: String, reason: String },

    #[error("inventory source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("missing connection settings: {}", missing.join(", "))]
    MissingConnection { missing: Vec<&'static str> },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Source ──────────────────────────────────────────────────────────

/// Where configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventorySource {
    /// `MM_*` environment variables only.
    Environment,
    /// A configuration file; `MM_*` variables fill in missing keys.
    File(PathBuf),
}

impl InventorySource {
    /// Classify an inventory path argument.
    ///
    /// Anything ending in `@micetro_inventory` selects the environment;
    /// otherwise the file name must be one of [`VALID_STEMS`] with a
    /// `.yml`, `.yaml` or `.json` extension. Existence is checked at load
    /// time.
    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        if path.ends_with(ENV_SENTINEL) {
            return Ok(Self::Environment);
        }

        let unsupported = |reason: &str| ConfigError::UnsupportedSource {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };

        let file = Path::new(path);
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let ext = file.extension().and_then(|s| s.to_str()).unwrap_or_default();

        if !VALID_STEMS.contains(&stem) {
            return Err(unsupported(
                "file name must be micetro, micetro_inv or micetro_inventory",
            ));
        }
        if !VALID_EXTENSIONS.contains(&ext) {
            return Err(unsupported("extension must be .yml, .yaml or .json"));
        }

        // Relative paths are resolved against the working directory so that
        // same-named files in different projects get distinct cache keys.
        let file = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());
        Ok(Self::File(file))
    }

    /// Identifier the cache key is derived from.
    pub fn cache_source(&self) -> String {
        match self {
            Self::Environment => ENV_SENTINEL.to_owned(),
            Self::File(path) => path.display().to_string(),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_source(&self.cache_source())
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Full inventory configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Must be [`PLUGIN_ID`] in configuration files.
    pub plugin: Option<String>,

    /// Suite base URL (e.g. "https://micetro.example.net").
    pub mm_url: Option<String>,
    pub mm_user: Option<String>,
    #[serde(skip_serializing)]
    pub mm_password: Option<String>,

    /// Child range names to scan; empty scans all.
    #[serde(deserialize_with = "scalar_list")]
    pub ranges: Vec<String>,

    /// Filter clauses, each a custom property -> value map.
    #[serde(deserialize_with = "scalar_maps")]
    pub filters: Vec<IndexMap<String, String>>,
    pub filter_mode: FilterMode,

    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,

    /// Verify the suite's TLS certificate. Off by default.
    pub validate_certs: bool,
    pub ca_cert: Option<PathBuf>,

    pub page_size: usize,
    pub concurrency: usize,
    pub group_prefix: String,

    pub cache: CacheSettings,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        let retry = RetryPolicy::default();
        let options = InventoryOptions::default();
        Self {
            plugin: None,
            mm_url: None,
            mm_user: None,
            mm_password: None,
            ranges: Vec::new(),
            filters: Vec::new(),
            filter_mode: FilterMode::default(),
            timeout: transport.timeout.as_secs(),
            retry_attempts: retry.max_attempts,
            retry_delay_ms: u64::try_from(retry.delay.as_millis()).unwrap_or(u64::MAX),
            validate_certs: false,
            ca_cert: None,
            page_size: options.page_size,
            concurrency: options.concurrency,
            group_prefix: options.naming.prefix,
            cache: CacheSettings::default(),
        }
    }
}

impl fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("plugin", &self.plugin)
            .field("mm_url", &self.mm_url)
            .field("mm_user", &self.mm_user)
            .field("mm_password", &self.mm_password.as_ref().map(|_| "[REDACTED]"))
            .field("ranges", &self.ranges)
            .field("filters", &self.filters)
            .field("filter_mode", &self.filter_mode)
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("validate_certs", &self.validate_certs)
            .field("ca_cert", &self.ca_cert)
            .field("page_size", &self.page_size)
            .field("concurrency", &self.concurrency)
            .field("group_prefix", &self.group_prefix)
            .field("cache", &self.cache)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    #[default]
    Jsonfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub backend: CacheBackend,
    /// Directory for the `jsonfile` backend.
    pub connection: Option<PathBuf>,
    pub prefix: String,
    /// Entry lifetime in seconds; `0` never expires.
    pub timeout: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: CacheBackend::default(),
            connection: None,
            prefix: "micetro_inv".into(),
            timeout: 3600,
        }
    }
}

/// `MM_*` variables, already parsed. Unset or empty variables are skipped
/// so they never mask a default.
#[derive(Debug, Default, Serialize)]
struct EnvLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    mm_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mm_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mm_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<Vec<IndexMap<String, String>>>,
}

impl EnvLayer {
    fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        Self {
            mm_url: var(ENV_HOST),
            mm_user: var(ENV_USER),
            mm_password: var(ENV_PASSWORD),
            ranges: var(ENV_RANGES).map(|v| parse_range_list(&v)),
            filters: var(ENV_FILTERS).map(|v| parse_filter_pairs(&v)),
        }
    }
}

/// `LAN1, LAN2` -> `["LAN1", "LAN2"]`.
pub fn parse_range_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// `location=London,owner=ops` -> one clause per pair. Entries without
/// `=` are ignored.
pub fn parse_filter_pairs(raw: &str) -> Vec<IndexMap<String, String>> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| IndexMap::from([(k.to_owned(), v.to_owned())]))
        .collect()
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load and validate the configuration for `source`.
///
/// Layers, lowest first: built-in defaults, `MM_*` environment, the
/// configuration file, `MICETRO_*` tuning overrides.
pub fn load(source: &InventorySource) -> Result<InventoryConfig, ConfigError> {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(InventoryConfig::default()))
        .merge(Serialized::defaults(EnvLayer::from_env()));

    if let InventorySource::File(path) = source {
        if !path.is_file() {
            return Err(ConfigError::SourceNotFound { path: path.clone() });
        }
        figment = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Yaml::file(path)),
        };
    }

    let figment = figment.merge(
        Env::prefixed(ENV_TUNING_PREFIX)
            .ignore(&["inventory", "mm_password"])
            .split("__"),
    );

    let config: InventoryConfig = figment.extract()?;
    config.validate(source)?;
    debug!(?source, ranges = config.ranges.len(), filters = config.filters.len(), "configuration loaded");
    Ok(config)
}

// ── Validation & translation ────────────────────────────────────────

impl InventoryConfig {
    pub fn validate(&self, source: &InventorySource) -> Result<(), ConfigError> {
        if matches!(source, InventorySource::File(_)) && self.plugin.as_deref() != Some(PLUGIN_ID) {
            return Err(ConfigError::Validation {
                field: "plugin".into(),
                reason: format!("must be '{PLUGIN_ID}'"),
            });
        }

        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        let missing: Vec<&'static str> = [
            ("mm_url", blank(&self.mm_url)),
            ("mm_user", blank(&self.mm_user)),
            ("mm_password", blank(&self.mm_password)),
        ]
        .into_iter()
        .filter_map(|(name, is_blank)| is_blank.then_some(name))
        .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingConnection { missing });
        }

        for (field, value) in [
            ("page_size", self.page_size),
            ("concurrency", self.concurrency),
            ("retry_attempts", usize::try_from(self.retry_attempts).unwrap_or(usize::MAX)),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be at least 1".into(),
                });
            }
        }

        Ok(())
    }

    pub fn to_connection(&self) -> Result<Connection, ConfigError> {
        let url = self.mm_url.as_deref().unwrap_or_default();
        Connection::new(
            url,
            self.mm_user.clone().unwrap_or_default(),
            SecretString::from(self.mm_password.clone().unwrap_or_default()),
        )
        .map_err(|e| ConfigError::Validation {
            field: "mm_url".into(),
            reason: e.to_string(),
        })
    }

    pub fn to_transport(&self) -> TransportConfig {
        let tls = match (&self.ca_cert, self.validate_certs) {
            (_, false) => TlsMode::DangerAcceptInvalid,
            (Some(ca), true) => TlsMode::CustomCa(ca.clone()),
            (None, true) => TlsMode::System,
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
            retry: RetryPolicy {
                max_attempts: self.retry_attempts,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }

    pub fn to_options(&self) -> InventoryOptions {
        let defaults = InventoryOptions::default();
        InventoryOptions {
            ranges: self.ranges.iter().cloned().collect(),
            filters: FilterSet::new(self.filter_mode, self.filters.iter().map(|c| c.iter())),
            naming: GroupNaming {
                prefix: self.group_prefix.clone(),
                ..defaults.naming
            },
            page_size: self.page_size,
            concurrency: self.concurrency,
            ..defaults
        }
    }

    /// The configured cache backend, or `None` when caching is off.
    pub fn open_cache(&self) -> Option<Box<dyn InventoryCache>> {
        if !self.cache.enabled {
            return None;
        }
        let ttl = (self.cache.timeout > 0).then(|| Duration::from_secs(self.cache.timeout));
        Some(match self.cache.backend {
            CacheBackend::Memory => Box::new(MemoryCache::new(ttl)),
            CacheBackend::Jsonfile => {
                let dir = self.cache.connection.clone().unwrap_or_else(default_cache_dir);
                Box::new(JsonFileCache::new(dir, self.cache.prefix.clone(), ttl))
            }
        })
    }
}

/// Platform cache directory, falling back to the system temp directory.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("net", "micetro", "micetro-inventory").map_or_else(
        || std::env::temp_dir().join("micetro_inv_cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

// ── Serde helpers ───────────────────────────────────────────────────

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// A list of scalars, or a single comma-separated string.
fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => parse_range_list(&s),
        Value::Null => Vec::new(),
        other => scalar_to_string(other).into_iter().collect(),
    })
}

/// A list of property maps, or a single `k=v,k=v` string. Scalar values
/// are stringified so `rack: 12` matches a `"12"` property.
fn scalar_maps<'de, D>(deserializer: D) -> Result<Vec<IndexMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let to_clause = |value: Value| match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
            .collect::<IndexMap<_, _>>()),
        other => Err(D::Error::custom(format!(
            "filter entries must be maps of property: value, got {other}"
        ))),
    };

    match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(to_clause).collect(),
        Value::String(s) => Ok(parse_filter_pairs(&s)),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![to_clause(other)?]),
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    const CONFIG_YAML: &str = r#"
plugin: ansilabnl.micetro.inventory
mm_url: "https://micetro.example.net"
mm_user: apiuser
mm_password: apipasswd
ranges:
  - 172.16.17.0/24
filters:
  - location: London
  - rack: 12
"#;

    fn err_str(err: impl fmt::Display) -> String {
        err.to_string()
    }

    // ── Source ──

    #[test]
    fn sentinel_selects_environment() {
        assert_eq!(
            InventorySource::from_path("@micetro_inventory").expect("source"),
            InventorySource::Environment
        );
        assert_eq!(
            InventorySource::from_path("/inv/@micetro_inventory").expect("source"),
            InventorySource::Environment
        );
    }

    #[test]
    fn accepted_file_names() {
        for path in ["micetro.yml", "/etc/ansible/micetro_inv.yaml", "micetro_inventory.json"] {
            assert!(
                matches!(InventorySource::from_path(path), Ok(InventorySource::File(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn rejected_file_names() {
        for path in ["inventory.yml", "micetro.toml", "micetro", "hosts"] {
            assert!(
                matches!(
                    InventorySource::from_path(path),
                    Err(ConfigError::UnsupportedSource { .. })
                ),
                "{path}"
            );
        }
    }

    #[test]
    fn cache_key_follows_the_source() {
        let env = InventorySource::Environment;
        assert_eq!(env.cache_key(), CacheKey::for_source(ENV_SENTINEL));
        assert_ne!(
            env.cache_key(),
            InventorySource::File("micetro.yml".into()).cache_key()
        );
    }

    #[test]
    fn relative_sources_in_different_directories_get_distinct_keys() {
        let mut keys = Vec::new();
        for _ in 0..2 {
            Jail::expect_with(|jail| {
                jail.create_file("micetro.yml", CONFIG_YAML)?;
                let source = InventorySource::from_path("micetro.yml").map_err(err_str)?;
                let InventorySource::File(path) = &source else {
                    panic!("expected a file source, got {source:?}");
                };
                assert!(path.is_absolute());
                assert!(path.is_file());
                keys.push(source.cache_key());
                Ok(())
            });
        }
        assert_ne!(keys[0], keys[1]);
    }

    // ── Env parsing ──

    #[test]
    fn env_list_formats() {
        assert_eq!(parse_range_list(" LAN1, ,LAN2 "), ["LAN1", "LAN2"]);
        assert_eq!(
            parse_filter_pairs("location=London, owner = ops,junk"),
            [
                IndexMap::from([("location".to_owned(), "London".to_owned())]),
                IndexMap::from([("owner".to_owned(), "ops".to_owned())]),
            ]
        );
    }

    // ── Loading ──

    #[test]
    fn file_config_loads_and_translates() {
        Jail::expect_with(|jail| {
            jail.create_file("micetro.yml", CONFIG_YAML)?;

            let source = InventorySource::from_path("micetro.yml").map_err(err_str)?;
            let config = load(&source).map_err(err_str)?;

            assert_eq!(config.mm_url.as_deref(), Some("https://micetro.example.net"));
            assert_eq!(config.ranges, ["172.16.17.0/24"]);
            assert_eq!(config.filters.len(), 2);
            assert_eq!(config.filters[1]["rack"], "12");

            let options = config.to_options();
            assert!(options.ranges.contains("172.16.17.0/24"));
            assert_eq!(
                options.filters.required().get("location").map(String::as_str),
                Some("london")
            );
            assert_eq!(options.page_size, 1000);

            let transport = config.to_transport();
            assert_eq!(transport.tls, TlsMode::DangerAcceptInvalid);
            assert_eq!(transport.retry.max_attempts, 5);

            let conn = config.to_connection().map_err(err_str)?;
            assert_eq!(conn.username(), "apiuser");
            Ok(())
        });
    }

    #[test]
    fn environment_fills_gaps_but_file_wins() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "micetro_inv.yaml",
                "plugin: ansilabnl.micetro.inventory\nmm_url: https://from-file.example.net\n",
            )?;
            jail.set_env(ENV_HOST, "https://from-env.example.net");
            jail.set_env(ENV_USER, "envuser");
            jail.set_env(ENV_PASSWORD, "12345");

            let source = InventorySource::from_path("micetro_inv.yaml").map_err(err_str)?;
            let config = load(&source).map_err(err_str)?;

            assert_eq!(config.mm_url.as_deref(), Some("https://from-file.example.net"));
            assert_eq!(config.mm_user.as_deref(), Some("envuser"));
            assert_eq!(config.mm_password.as_deref(), Some("12345"));
            Ok(())
        });
    }

    #[test]
    fn environment_only_source() {
        Jail::expect_with(|jail| {
            jail.set_env(ENV_HOST, "https://micetro.example.net");
            jail.set_env(ENV_USER, "apiuser");
            jail.set_env(ENV_PASSWORD, "secret");
            jail.set_env(ENV_RANGES, "LAN1,LAN2");
            jail.set_env(ENV_FILTERS, "location=London,owner=ops");
            jail.set_env("MICETRO_PAGE_SIZE", "250");
            jail.set_env("MICETRO_CACHE__ENABLED", "true");

            let config = load(&InventorySource::Environment).map_err(err_str)?;
            assert_eq!(config.ranges, ["LAN1", "LAN2"]);
            assert_eq!(config.filters.len(), 2);
            assert_eq!(config.page_size, 250);
            assert!(config.cache.enabled);
            assert!(config.plugin.is_none());
            Ok(())
        });
    }

    #[test]
    fn missing_connection_settings_are_listed() {
        Jail::expect_with(|jail| {
            jail.set_env(ENV_HOST, "https://micetro.example.net");

            match load(&InventorySource::Environment) {
                Err(ConfigError::MissingConnection { missing }) => {
                    assert_eq!(missing, ["mm_user", "mm_password"]);
                }
                other => panic!("expected MissingConnection, got {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn wrong_plugin_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "micetro.yml",
                "plugin: someone.else.inventory\nmm_url: https://x\nmm_user: u\nmm_password: p\n",
            )?;
            let source = InventorySource::from_path("micetro.yml").map_err(err_str)?;
            assert!(matches!(
                load(&source),
                Err(ConfigError::Validation { ref field, .. }) if field == "plugin"
            ));
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_reported() {
        Jail::expect_with(|_jail| {
            let source = InventorySource::from_path("micetro.yml").map_err(err_str)?;
            assert!(matches!(load(&source), Err(ConfigError::SourceNotFound { .. })));
            Ok(())
        });
    }

    #[test]
    fn debug_redacts_password() {
        let config = InventoryConfig {
            mm_password: Some("hunter2".into()),
            ..InventoryConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn cache_backends() {
        let mut config = InventoryConfig::default();
        assert!(config.open_cache().is_none());

        config.cache.enabled = true;
        config.cache.backend = CacheBackend::Memory;
        assert!(config.open_cache().is_some());
    }
}
