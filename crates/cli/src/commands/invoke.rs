//! Invoke command: propose, endorse, assemble and broadcast.

use super::open_client_as;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use fabsdk_client::{proposal_responses, MatchingPayloads, SdkConfig};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Args)]
pub struct InvokeArgs {
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

    /// Require identical results from every endorser
    #[arg(long)]
    strict: bool,

    /// Transient data as key=value, never written to the ledger
    #[arg(long = "transient", value_parser = parse_transient)]
    transient: Vec<(String, String)>,

    /// Chaincode arguments, function name first
    #[arg(required = true)]
    args: Vec<String>,
}

fn parse_transient(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

pub async fn run(args: InvokeArgs, config: SdkConfig) -> Result<()> {
    let client = open_client_as(config, &args.user)?;
    let mut channel = client.new_configured_channel(&args.channel)?;
    if args.strict {
        channel.set_endorsement_policy(Arc::new(MatchingPayloads));
    }
    if channel.peers().is_empty() || channel.orderers().is_empty() {
        bail!("Invoke needs at least one peer and one orderer configured");
    }

    let transient: BTreeMap<_, _> = args
        .transient
        .into_iter()
        .map(|(k, v)| (k, v.into_bytes()))
        .collect();

    println!("{}", "Invoking chaincode...".bold().cyan());
    println!();

    let (signed, proposal, tx_id) = channel.create_transaction_proposal(
        &args.chaincode,
        &args.channel,
        args.args.as_slice(),
        true,
        transient,
    )?;
    println!("  Tx ID:     {}", tx_id.bright_yellow());

    let responses = channel.send_transaction_proposal(&signed, args.retry).await?;
    for response in responses.values() {
        if let Some(e) = response.error() {
            println!("  {} {}  {}", "✗".red().bold(), response.endorser, e);
        }
    }

    let endorsed = proposal_responses(&responses);
    println!(
        "  Endorsed:  {}/{}",
        endorsed.len().to_string().bright_cyan(),
        responses.len()
    );

    let tx = channel
        .create_transaction(&proposal, &endorsed)
        .context("Failed to assemble transaction")?;
    let results = channel
        .send_transaction(&proposal, &tx)
        .await
        .context("Failed to broadcast transaction")?;

    let accepted = results.values().filter(|r| r.is_ok()).count();
    println!(
        "  Ordered:   {}/{}",
        accepted.to_string().bright_cyan(),
        results.len()
    );
    println!();
    println!("{}  Transaction submitted", "✓".green().bold());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transient() {
        assert_eq!(
            parse_transient("price=100").unwrap(),
            ("price".to_string(), "100".to_string())
        );
        assert_eq!(
            parse_transient("k=a=b").unwrap(),
            ("k".to_string(), "a=b".to_string())
        );
        assert!(parse_transient("novalue").is_err());
    }
}
