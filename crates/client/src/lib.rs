//! Client SDK for a permissioned ledger.
//!
//! A [`Channel`] drives the execute-order flow: build a signed proposal,
//! fan it out to endorsing peers, assemble the endorsed transaction and
//! fan the signed envelope out to ordering nodes.
//!
//! # Example
//! ```no_run
//! use fabsdk_client::{Client, SdkConfig, User};
//! use fabsdk_core::Keypair;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(Client::new(SdkConfig::default())?);
//! client.set_user_context(User::new("admin", b"cert".to_vec(), Keypair::generate()), true)?;
//!
//! let channel = client.new_configured_channel("mychannel")?;
//! let args = ["invoke", "a", "b", "1"];
//! let (signed, proposal, tx_id) =
//!     channel.create_transaction_proposal("mycc", "mychannel", &args, true, BTreeMap::new())?;
//! let responses = channel.send_transaction_proposal(&signed, 0).await?;
//! let endorsed = fabsdk_client::proposal_responses(&responses);
//! let tx = channel.create_transaction(&proposal, &endorsed)?;
//! channel.send_transaction(&proposal, &tx).await?;
//! println!("committed {}", tx_id);
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod mock;
pub mod orderer;
pub mod peer;
pub mod policy;
pub mod response;
pub mod retry;
pub mod transport;

pub use channel::Channel;
pub use config::{load_config, parse_config, ConfigError, SdkConfig};
pub use context::{Client, User};
pub use error::{ChannelError, EndpointError, Result};
pub use mock::{MockOrderer, MockPeer};
pub use orderer::{Orderer, RemoteOrderer};
pub use peer::{Peer, RemotePeer};
pub use policy::{AcceptAll, EndorsementPolicy, MatchingPayloads};
pub use response::{proposal_responses, TransactionProposalResponse, TransactionResponse};
pub use retry::{calculate_backoff, RetryPolicy};
pub use transport::ConnectionOptions;
