// Range endpoints
//
// `GET Ranges` lists the range tree (each range carries its direct
// children and DHCP scopes); `GET <range>/NextFreeAddress` finds the next
// unassigned address inside one range.

use tracing::debug;

use crate::error::Error;
use crate::gateway::Gateway;
use crate::models::{FreeAddress, Range, RangeList};
use crate::query::{ApiFlag, Query};

/// Options for [`Gateway::next_free_address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeAddressOptions {
    /// Seconds to hold a temporary claim on the returned address; `0`
    /// leaves it unclaimed.
    pub claim_secs: u32,
    /// Ask the suite to ping candidates before offering them.
    pub ping: bool,
    /// Skip addresses inside DHCP scopes.
    pub exclude_dhcp: bool,
    /// Start searching at this address instead of the range start.
    pub start_address: Option<String>,
    /// Extra suite filter expression applied to candidates.
    pub filter: Option<String>,
}

impl Default for FreeAddressOptions {
    fn default() -> Self {
        Self {
            claim_secs: 0,
            ping: true,
            exclude_dhcp: false,
            start_address: None,
            filter: None,
        }
    }
}

impl FreeAddressOptions {
    fn to_query(&self) -> Query {
        let claim = (self.claim_secs > 0).then_some(self.claim_secs);
        Query::new()
            .param_opt("temporaryClaimTime", claim)
            .param_opt("filter", self.filter.as_deref().filter(|f| !f.is_empty()))
            .param("excludeDHCP", ApiFlag(self.exclude_dhcp))
            .param("ping", ApiFlag(self.ping))
            .param_opt(
                "startAddress",
                self.start_address.as_deref().filter(|a| !a.is_empty()),
            )
    }
}

impl Gateway {
    /// List ranges, optionally narrowed by a suite filter expression
    /// (a CIDR, an address, a range name, or `name=...`).
    ///
    /// `GET Ranges[?filter=<expr>]`
    pub async fn list_ranges(&self, filter: Option<&str>) -> Result<RangeList, Error> {
        debug!(filter, "listing ranges");
        let query = Query::new().param_opt("filter", filter);
        self.get("Ranges", &query).await?.result_or_default()
    }

    /// The first range matching `network`, if any.
    pub async fn find_range(&self, network: &str) -> Result<Option<Range>, Error> {
        let list = self.list_ranges(Some(network)).await?;
        if list.total_results == Some(0) {
            return Ok(None);
        }
        Ok(list.ranges.into_iter().next())
    }

    /// References of every DHCP scope on the ranges containing `address`.
    pub async fn dhcp_scopes_for(&self, address: &str) -> Result<Vec<String>, Error> {
        let list = self.list_ranges(Some(address)).await?;
        Ok(list
            .ranges
            .into_iter()
            .flat_map(|range| range.dhcp_scopes)
            .map(|scope| scope.reference)
            .collect())
    }

    /// Ask the suite for the next free address in `range_ref`.
    ///
    /// `GET <range_ref>/NextFreeAddress`. Returns `Ok(None)` when the range
    /// is exhausted (the suite answers without a payload).
    pub async fn next_free_address(
        &self,
        range_ref: &str,
        options: &FreeAddressOptions,
    ) -> Result<Option<String>, Error> {
        let endpoint = format!("{}/NextFreeAddress", range_ref.trim_matches('/'));
        debug!(range_ref, claim = options.claim_secs, "requesting next free address");

        let response = self.get(&endpoint, &options.to_query()).await?;
        let free: FreeAddress = response.result_or_default()?;
        Ok(free.address.filter(|a| !a.is_empty()))
    }
}
