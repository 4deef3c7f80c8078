//! Query command: endorse only, print each peer's answer.

use super::open_client_as;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use fabsdk_client::SdkConfig;
use std::collections::BTreeMap;

#[derive(Args)]
pub struct QueryArgs {
    /// Signing user
    #[arg(short, long)]
    user: String,

    /// Channel name
    #[arg(long, default_value = "mychannel")]
    channel: String,

    /// Chaincode name
    #[arg(long)]
    chaincode: String,

    /// Extra attempts per peer after a connection failure
    #[arg(long, default_value = "0")]
    retry: u32,

    /// Chaincode arguments, function name first
    #[arg(required = true)]
    args: Vec<String>,
}

pub async fn run(args: QueryArgs, config: SdkConfig) -> Result<()> {
    let client = open_client_as(config, &args.user)?;
    let channel = client.new_configured_channel(&args.channel)?;
    if channel.peers().is_empty() {
        bail!("No peers configured");
    }

    let (signed, _, tx_id) = channel.create_transaction_proposal(
        &args.chaincode,
        &args.channel,
        args.args.as_slice(),
        true,
        BTreeMap::new(),
    )?;
    let responses = channel.send_transaction_proposal(&signed, args.retry).await?;

    println!("{}", "Query results:".bold().cyan());
    println!("  Tx ID: {}", tx_id.bright_black());
    println!();

    let mut endorsers: Vec<_> = responses.keys().cloned().collect();
    endorsers.sort();
    let mut failed = 0;
    for endorser in endorsers {
        let response = &responses[&endorser];
        match &response.result {
            Ok(r) if r.is_success() => println!(
                "  {} {}  {}",
                "✓".green().bold(),
                endorser,
                String::from_utf8_lossy(&r.response.payload).bright_yellow()
            ),
            Ok(r) => {
                failed += 1;
                println!(
                    "  {} {}  status {}: {}",
                    "✗".red().bold(),
                    endorser,
                    r.status(),
                    r.response.message
                );
            }
            Err(e) => {
                failed += 1;
                println!("  {} {}  {}", "✗".red().bold(), endorser, e);
            }
        }
    }

    if failed == responses.len() {
        bail!("No peer answered the query");
    }
    Ok(())
}
