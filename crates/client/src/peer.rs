//! Endorsing peers.

use crate::config::{PeerConfig, SdkConfig};
use crate::error::EndpointError;
use crate::transport::{BoxedStream, ConnectionOptions};
use async_trait::async_trait;
use fabsdk_core::protos::{ProposalResponse, SignedProposal};
use fabsdk_core::{read_frame, write_frame};
use std::time::Duration;

/// A peer that can simulate and endorse a signed proposal.
#[async_trait]
pub trait Peer: Send + Sync {
    /// Address used to key this peer within a channel.
    fn url(&self) -> &str;

    /// Send a signed proposal and wait for the endorsement response.
    async fn send_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, EndpointError>;
}

/// Peer reached over a framed TCP or TLS stream.
///
/// Each call opens a fresh connection, writes one `SignedProposal` frame
/// and reads one `ProposalResponse` frame back.
#[derive(Debug, Clone)]
pub struct RemotePeer {
    url: String,
    options: ConnectionOptions,
    request_timeout: Option<Duration>,
}

impl RemotePeer {
    pub fn new(url: impl Into<String>, options: ConnectionOptions) -> Self {
        Self {
            url: url.into(),
            options,
            request_timeout: None,
        }
    }

    pub fn from_config(
        config: &SdkConfig,
        peer: &PeerConfig,
        options: ConnectionOptions,
    ) -> Self {
        Self::new(peer.address(), options).with_request_timeout(config.timeouts.peer_request())
    }

    /// Bound the request/response exchange after connecting.
    pub fn with_request_timeout(mut self, limit: Option<Duration>) -> Self {
        self.request_timeout = limit;
        self
    }
}

#[async_trait]
impl Peer for RemotePeer {
    fn url(&self) -> &str {
        &self.url
    }

    async fn send_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, EndpointError> {
        let mut stream = self.options.connect(&self.url).await?;

        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange(&mut stream, proposal))
                .await
                .map_err(|_| EndpointError::Timeout(limit))?,
            None => exchange(&mut stream, proposal).await,
        }
    }
}

async fn exchange(
    stream: &mut BoxedStream,
    proposal: &SignedProposal,
) -> Result<ProposalResponse, EndpointError> {
    write_frame(stream, proposal).await?;
    read_frame(stream).await?.ok_or(EndpointError::Closed)
}
