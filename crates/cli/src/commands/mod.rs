//! CLI commands module.

use anyhow::{Context, Result};
use clap::Subcommand;
use fabsdk_client::{load_config, Client, SdkConfig};
use fabsdk_storage::SledStore;
use std::path::Path;
use std::sync::Arc;

mod invoke;
mod query;
mod user;

#[derive(Subcommand)]
pub enum Commands {
    /// Manage enrolled users in the local keystore
    User(user::UserArgs),
    /// Evaluate a chaincode function on the peers without ordering
    Query(query::QueryArgs),
    /// Endorse and submit a chaincode transaction
    Invoke(invoke::InvokeArgs),
}

/// Load the configuration file, or defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<SdkConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(SdkConfig::default()),
    }
}

pub async fn run(cmd: Commands, config: SdkConfig) -> Result<()> {
    match cmd {
        Commands::User(args) => user::run(args, config),
        Commands::Query(args) => query::run(args, config).await,
        Commands::Invoke(args) => invoke::run(args, config).await,
    }
}

/// Client backed by the configured keystore.
fn open_client(config: SdkConfig) -> Result<Arc<Client>> {
    let keystore = config.keystore.path.clone();
    let store = SledStore::open(&keystore)
        .with_context(|| format!("Failed to open keystore at {}", keystore.display()))?;
    let client = Client::new(config)?;
    client.set_state_store(Arc::new(store));
    Ok(Arc::new(client))
}

/// Client with `user` loaded as the signing identity.
fn open_client_as(config: SdkConfig, user: &str) -> Result<Arc<Client>> {
    let client = open_client(config)?;
    client
        .user_context(user)
        .with_context(|| format!("Unknown user '{}'. Create it with 'fabsdk user new'", user))?;
    Ok(client)
}
