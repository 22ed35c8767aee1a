// Record filter & grouping engine: fetch records per selected range and
// fold them into an `Inventory`.

use std::pin::pin;

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use micetro_api::{Gateway, HostnamePolicy, IpamRecord, RangeRef};

use crate::error::CoreError;
use crate::filter::FilterSet;
use crate::inventory::{GroupNaming, Inventory, InventoryAccumulator};
use crate::walker::{RangeSelector, select_ranges};

/// Knobs for one aggregation pass.
#[derive(Debug, Clone)]
pub struct InventoryOptions {
    pub ranges: RangeSelector,
    pub filters: FilterSet,
    pub naming: GroupNaming,
    pub hostname_policy: HostnamePolicy,
    /// Records requested per `GetIPAMRecords` page.
    pub page_size: usize,
    /// Ranges fetched concurrently. `1` walks them strictly one by one.
    pub concurrency: usize,
}

impl Default for InventoryOptions {
    fn default() -> Self {
        Self {
            ranges: RangeSelector::new(),
            filters: FilterSet::default(),
            naming: GroupNaming::default(),
            hostname_policy: HostnamePolicy::default(),
            page_size: 1000,
            concurrency: 1,
        }
    }
}

/// Fetch and fold the records of `ranges`.
///
/// Up to `concurrency` ranges are in flight at once, but results are
/// folded in `ranges` order so group ordering does not depend on timing.
/// The first error aborts the pass and drops every in-flight fetch.
pub async fn aggregate(
    gateway: &Gateway,
    ranges: &[RangeRef],
    options: &InventoryOptions,
) -> Result<Inventory, CoreError> {
    let mut acc =
        InventoryAccumulator::new(options.naming.clone()).with_hostname_policy(options.hostname_policy);

    let mut fetches = pin!(
        stream::iter(ranges)
            .map(|range| async move {
                let records: Vec<IpamRecord> = gateway
                    .ipam_records(&range.name, options.page_size)
                    .try_collect()
                    .await?;
                Ok::<_, CoreError>((range, records))
            })
            .buffered(options.concurrency.max(1))
    );

    while let Some(fetched) = fetches.next().await {
        let (range, records) = fetched?;
        let total = records.len();
        let kept = acc.add_range(range, records, &options.filters);
        debug!(range = %range.name, total, kept, "range aggregated");
    }

    Ok(acc.finish())
}

/// Walk the range tree, then aggregate every selected range.
pub async fn build_inventory(
    gateway: &Gateway,
    options: &InventoryOptions,
) -> Result<Inventory, CoreError> {
    let ranges = select_ranges(gateway, &options.ranges).await?;
    let inventory = aggregate(gateway, &ranges, options).await?;
    info!(
        ranges = ranges.len(),
        hosts = inventory.hosts.len(),
        groups = inventory.groups.len(),
        "inventory built"
    );
    Ok(inventory)
}
