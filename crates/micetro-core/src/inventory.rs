// Aggregated inventory model and the pure accumulator that builds it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use micetro_api::{HostnamePolicy, IpamRecord, RangeRef};

use crate::filter::FilterSet;
use crate::sanitize::sanitize;

/// Reserved group every kept host belongs to.
pub const ALL_GROUP: &str = "all";

/// One `(hostname, address)` pair. The same hostname may appear more than
/// once when it is assigned in several ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    pub name: String,
    pub address: String,
}

/// Result of one aggregation pass; this is also the cached value.
///
/// Group names are stored already sanitized and group member lists keep
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub hosts: Vec<HostEntry>,
    pub groups: IndexMap<String, Vec<String>>,
}

impl Inventory {
    /// Address of the first entry for `name`.
    pub fn address_of(&self, name: &str) -> Option<&str> {
        self.hosts
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.address.as_str())
    }

    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }
}

/// Naming scheme for synthesized groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNaming {
    /// Leading token of custom-property groups (`<prefix>_<prop>_<value>`).
    pub prefix: String,
    /// Reserved group that, like `all`, lists every kept host.
    pub catch_all: String,
}

impl Default for GroupNaming {
    fn default() -> Self {
        Self {
            prefix: "micetro".into(),
            catch_all: "mm_urls".into(),
        }
    }
}

impl GroupNaming {
    pub fn property_group(&self, key: &str, value: &str) -> String {
        sanitize(&format!("{}_{key}_{value}", self.prefix))
    }

    pub fn range_group(range_name: &str) -> String {
        format!("range_{}", sanitize(range_name))
    }
}

/// Folds IPAM records into an [`Inventory`].
///
/// Pure: no I/O. Feed it one range at a time, in traversal order.
#[derive(Debug)]
pub struct InventoryAccumulator {
    naming: GroupNaming,
    hostname_policy: HostnamePolicy,
    inventory: Inventory,
}

impl InventoryAccumulator {
    pub fn new(naming: GroupNaming) -> Self {
        let mut groups = IndexMap::new();
        groups.insert(ALL_GROUP.to_owned(), Vec::new());
        groups.insert(naming.catch_all.clone(), Vec::new());

        Self {
            naming,
            hostname_policy: HostnamePolicy::default(),
            inventory: Inventory {
                hosts: Vec::new(),
                groups,
            },
        }
    }

    pub fn with_hostname_policy(mut self, policy: HostnamePolicy) -> Self {
        self.hostname_policy = policy;
        self
    }

    /// Add every eligible record of `range`. Returns how many were kept.
    pub fn add_range(
        &mut self,
        range: &RangeRef,
        records: impl IntoIterator<Item = IpamRecord>,
        filters: &FilterSet,
    ) -> usize {
        let range_group = GroupNaming::range_group(&range.name);
        records
            .into_iter()
            .filter(|record| self.add_record(&range_group, record, filters))
            .count()
    }

    /// Add one record. Returns `false` when it was skipped (not assigned,
    /// no DNS binding, or rejected by `filters`).
    pub fn add_record(&mut self, range_group: &str, record: &IpamRecord, filters: &FilterSet) -> bool {
        if !record.is_assigned() {
            return false;
        }
        let Some(hostname) = record.primary_hostname(self.hostname_policy) else {
            return false;
        };

        let sanitized: Vec<(String, String)> = record
            .custom_properties
            .iter()
            .map(|(k, v)| (sanitize(k), sanitize(v)))
            .collect();
        if !filters.keeps(&sanitized) {
            return false;
        }

        self.inventory.hosts.push(HostEntry {
            name: hostname.to_owned(),
            address: record.address.clone(),
        });

        for (key, value) in &record.custom_properties {
            let group = self.naming.property_group(key, value);
            self.push_member(group, hostname);
        }
        self.push_member(range_group.to_owned(), hostname);
        self.push_member(ALL_GROUP.to_owned(), hostname);
        self.push_member(self.naming.catch_all.clone(), hostname);

        true
    }

    pub fn finish(self) -> Inventory {
        self.inventory
    }

    fn push_member(&mut self, group: String, hostname: &str) {
        self.inventory
            .groups
            .entry(group)
            .or_default()
            .push(hostname.to_owned());
    }
}
