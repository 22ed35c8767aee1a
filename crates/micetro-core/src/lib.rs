//! Inventory aggregation engine for the Micetro IPAM suite.
//!
//! Sits between `micetro-api` and the inventory binary:
//!
//! - **[`walker`]** lists the range tree and picks the child ranges to scan.
//! - **[`aggregate`]** pages through each range's assigned IPAM records,
//!   applies the [`FilterSet`], and folds kept records into an
//!   [`Inventory`] of hosts and property-derived groups.
//! - **[`cache`]** stores finished inventories behind the
//!   [`InventoryCache`] trait, keyed by configuration source.

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod sanitize;
pub mod walker;

pub use aggregate::{InventoryOptions, aggregate, build_inventory};
pub use cache::{
    CACHE_SCHEMA_VERSION, CacheKey, CachePolicy, InventoryCache, JsonFileCache, MemoryCache,
    load_or_build,
};
pub use error::CoreError;
pub use filter::{FilterMode, FilterSet};
pub use inventory::{ALL_GROUP, GroupNaming, HostEntry, Inventory, InventoryAccumulator};
pub use sanitize::sanitize;
pub use walker::{RangeSelector, select_ranges};
