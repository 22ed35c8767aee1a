//! `ip-info` and `free-ip` lookups.

use tracing::{debug, info};

use micetro_api::{FreeAddressOptions, Gateway};

use crate::cli::{FreeIpArgs, GlobalOpts, IpInfoArgs};
use crate::error::CliError;
use crate::output;

pub async fn ip_info(
    gateway: &Gateway,
    args: &IpInfoArgs,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    let record = gateway.ipam_record(&args.address).await?;
    output::render(&record, global.output, global.pretty)
}

pub async fn free_ip(
    gateway: &Gateway,
    args: &FreeIpArgs,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    // Without a claim the suite offers the same address every time.
    if args.count > 1 && args.claim == 0 {
        return Err(CliError::Validation {
            field: "count".into(),
            reason: "more than one address requires --claim".into(),
        });
    }

    let range = gateway
        .find_range(&args.range)
        .await?
        .ok_or_else(|| CliError::RangeNotFound {
            network: args.range.clone(),
        })?;
    debug!(range = %range.name, reference = %range.reference, "range resolved");

    let options = FreeAddressOptions {
        claim_secs: args.claim,
        ping: !args.no_ping,
        exclude_dhcp: args.exclude_dhcp,
        start_address: args.start.clone(),
        filter: args.filter.clone(),
    };

    let mut found = Vec::new();
    for _ in 0..args.count {
        match gateway.next_free_address(&range.reference, &options).await? {
            Some(address) => found.push(address),
            None => {
                return Err(CliError::InsufficientAddresses {
                    network: args.range.clone(),
                    requested: args.count,
                    found: u32::try_from(found.len()).unwrap_or(u32::MAX),
                });
            }
        }
    }

    info!(range = %range.name, count = found.len(), "free addresses found");
    output::render(&found, global.output, global.pretty)
}
