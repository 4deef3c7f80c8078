//! fabsdk CLI entry point.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "fabsdk")]
#[command(
    about = "Submit and query chaincode transactions on a permissioned ledger",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(
        msp = %config.msp.id,
        peers = config.peers.len(),
        orderers = config.orderers.len(),
        "Configuration loaded"
    );

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd, config).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("fabsdk - permissioned ledger client");
            println!("Run 'fabsdk --help' for usage information.");
        }
    }
}
