//! Clap derive structures for `micetro-inventory`.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Environment variable holding the inventory source path.
pub const INVENTORY_ENV: &str = "MICETRO_INVENTORY";

// ── Top-Level CLI ────────────────────────────────────────────────────

/// micetro-inventory -- Ansible dynamic inventory for Men&Mice Micetro
#[derive(Debug, Parser)]
#[command(
    name = "micetro-inventory",
    version,
    about = "Ansible dynamic inventory for Men&Mice Micetro",
    long_about = "Builds an Ansible inventory from the assigned IPAM records of a\n\
        Men&Mice Micetro suite. Hosts are grouped by range and by custom\n\
        property; results can be cached between runs.\n\n\
        Configuration comes from micetro.yml / micetro_inv.yml /\n\
        micetro_inventory.yml, or from MM_HOST, MM_USER, MM_PASSWORD,\n\
        MM_RANGES and MM_FILTERS when the inventory path is @micetro_inventory.",
    propagate_version = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Inventory source: a micetro(.yml|.yaml|.json) file or @micetro_inventory
    #[arg(
        long,
        short = 'i',
        env = INVENTORY_ENV,
        default_value = micetro_config::ENV_SENTINEL,
        global = true
    )]
    pub inventory: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Output format for lookups
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

// ── Inventory mode ───────────────────────────────────────────────────

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ModeArgs {
    /// Print the whole inventory as Ansible JSON
    #[arg(long)]
    pub list: bool,

    /// Print the variables of one host
    #[arg(long, value_name = "NAME")]
    pub host: Option<String>,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    /// Rebuild the inventory and overwrite the cache entry
    #[arg(long, conflicts_with = "no_cache")]
    pub refresh_cache: bool,

    /// Neither read nor write the cache for this run
    #[arg(long)]
    pub no_cache: bool,
}

// ── Lookups ──────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the IPAM record of one address
    #[command(name = "ip-info")]
    IpInfo(IpInfoArgs),

    /// Find free addresses in a range
    #[command(name = "free-ip")]
    FreeIp(FreeIpArgs),
}

#[derive(Debug, Args)]
pub struct IpInfoArgs {
    /// IP address to look up
    pub address: String,
}

#[derive(Debug, Args)]
pub struct FreeIpArgs {
    /// Range to search: CIDR (172.16.17.0/24), network address or range name
    pub range: String,

    /// Number of addresses to return
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,

    /// Temporarily claim each address for this many seconds
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub claim: u32,

    /// Do not ping candidates before offering them
    #[arg(long)]
    pub no_ping: bool,

    /// Skip addresses inside DHCP scopes
    #[arg(long)]
    pub exclude_dhcp: bool,

    /// Start searching at this address
    #[arg(long, value_name = "ADDR")]
    pub start: Option<String>,

    /// Extra suite filter expression for candidates
    #[arg(long, value_name = "EXPR")]
    pub filter: Option<String>,
}
