//! `--list` / `--host`: build (or load) the inventory and render it for
//! Ansible.

use tracing::debug;

use micetro_api::Gateway;
use micetro_config::{InventoryConfig, InventorySource};
use micetro_core::{CachePolicy, build_inventory, load_or_build};

use crate::cli::{CacheArgs, GlobalOpts, ModeArgs};
use crate::error::CliError;
use crate::output;

pub fn cache_policy(args: &CacheArgs) -> CachePolicy {
    if args.no_cache {
        CachePolicy::Disabled
    } else if args.refresh_cache {
        CachePolicy::Refresh
    } else {
        CachePolicy::Use
    }
}

pub async fn handle(
    gateway: &Gateway,
    source: &InventorySource,
    config: &InventoryConfig,
    mode: &ModeArgs,
    cache_args: &CacheArgs,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    let options = config.to_options();
    let cache = config.open_cache();
    let key = source.cache_key();
    let policy = cache_policy(cache_args);
    debug!(%key, ?policy, cached = cache.is_some(), "resolving inventory");

    let inventory = load_or_build(cache.as_deref(), &key, policy, || {
        build_inventory(gateway, &options)
    })
    .await?;

    if let (false, Some(name)) = (mode.list, &mode.host) {
        output::render_json(&output::ansible_host(&inventory, name), global.pretty)
    } else {
        output::render_json(&output::ansible_list(&inventory), global.pretty)
    }
}
