mod cli;
mod commands;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use micetro_api::Gateway;
use micetro_config::InventorySource;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.command.is_some() && (cli.mode.list || cli.mode.host.is_some()) {
        Cli::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                "--list and --host cannot be combined with a subcommand",
            )
            .exit();
    }

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let source = InventorySource::from_path(&cli.global.inventory)?;
    let config = micetro_config::load(&source)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let gateway = Gateway::new(config.to_connection()?, &config.to_transport())?
        .with_cancellation(cancel);
    tracing::debug!(url = %gateway.connection().base_url(), "gateway ready");

    let rendered = match &cli.command {
        Some(Command::IpInfo(args)) => commands::lookup::ip_info(&gateway, args, &cli.global).await?,
        Some(Command::FreeIp(args)) => commands::lookup::free_ip(&gateway, args, &cli.global).await?,
        None => {
            commands::inventory::handle(
                &gateway,
                &source,
                &config,
                &cli.mode,
                &cli.cache,
                &cli.global,
            )
            .await?
        }
    };

    output::print_output(&rendered)
}
