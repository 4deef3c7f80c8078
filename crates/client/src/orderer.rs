//! Ordering service endpoints and the broadcast stream.
//!
//! A broadcast runs through these phases on one connection:
//!
//! ```text
//! Connecting ─▶ StreamOpen ─▶ Sending ─▶ AwaitingAcks ─▶ Closed
//!      │                         │            │
//!      └─ connect error          └─ send err  └─ last non-success ack wins
//! ```
//!
//! The ack listener starts before the envelope is written so no response
//! can be missed. After the write the client half-closes its side; the
//! orderer acknowledges and closes, which ends the listener.

use crate::config::{OrdererConfig, SdkConfig};
use crate::error::EndpointError;
use crate::transport::ConnectionOptions;
use async_trait::async_trait;
use fabsdk_core::protos::{BroadcastResponse, Envelope};
use fabsdk_core::{read_frame, write_frame, WireError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::time::timeout;

/// An ordering service node that accepts signed envelopes.
#[async_trait]
pub trait Orderer: Send + Sync {
    /// Address used to key this orderer within a channel.
    fn url(&self) -> &str;

    /// Broadcast one envelope and wait for the stream to finish.
    async fn send_broadcast(&self, envelope: &Envelope) -> Result<(), EndpointError>;
}

#[derive(Debug, Clone)]
pub struct RemoteOrderer {
    url: String,
    options: ConnectionOptions,
    ack_timeout: Option<Duration>,
}

impl RemoteOrderer {
    pub fn new(url: impl Into<String>, options: ConnectionOptions) -> Self {
        Self {
            url: url.into(),
            options,
            ack_timeout: None,
        }
    }

    pub fn from_config(
        config: &SdkConfig,
        orderer: &OrdererConfig,
        options: ConnectionOptions,
    ) -> Self {
        Self::new(orderer.address(), options).with_ack_timeout(config.timeouts.ack())
    }

    /// Bound the wait for acknowledgements once the envelope is sent.
    /// Without it the call waits for the orderer to close the stream.
    pub fn with_ack_timeout(mut self, limit: Option<Duration>) -> Self {
        self.ack_timeout = limit;
        self
    }
}

#[async_trait]
impl Orderer for RemoteOrderer {
    fn url(&self) -> &str {
        &self.url
    }

    async fn send_broadcast(&self, envelope: &Envelope) -> Result<(), EndpointError> {
        let stream = self.options.connect(&self.url).await?;

        let (mut reader, mut writer) = tokio::io::split(stream);
        let url = self.url.clone();
        let mut listener = tokio::spawn(async move { listen_for_acks(&mut reader, &url).await });

        let sent = async {
            write_frame(&mut writer, envelope).await?;
            writer.shutdown().await.map_err(WireError::from)?;
            Ok::<_, EndpointError>(())
        }
        .await;
        if let Err(e) = sent {
            listener.abort();
            return Err(e);
        }

        let joined = match self.ack_timeout {
            Some(limit) => match timeout(limit, &mut listener).await {
                Ok(joined) => joined,
                Err(_) => {
                    listener.abort();
                    return Err(EndpointError::Timeout(limit));
                }
            },
            None => listener.await,
        };

        joined.map_err(|e| EndpointError::TaskFailed(e.to_string()))?
    }
}

/// Read acknowledgements until the orderer closes the stream.
///
/// Every non-success status replaces the previously recorded error. An
/// undecodable frame is recorded and skipped; any other stream error is
/// recorded and ends the loop.
async fn listen_for_acks<R>(reader: &mut R, url: &str) -> Result<(), EndpointError>
where
    R: AsyncRead + Unpin,
{
    let mut broadcast_err = None;
    loop {
        match read_frame::<_, BroadcastResponse>(reader).await {
            Ok(None) => break,
            Ok(Some(response)) => {
                tracing::debug!(orderer = url, status = %response.status, "Broadcast response");
                if !response.status.is_success() {
                    if !response.info.is_empty() {
                        tracing::debug!(orderer = url, info = %response.info, "Broadcast rejected");
                    }
                    broadcast_err = Some(EndpointError::BroadcastStatus(response.status));
                }
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(
                    orderer = url,
                    error = %e,
                    "Discarding malformed broadcast response"
                );
                broadcast_err = Some(e.into());
            }
            Err(e) => {
                broadcast_err = Some(e.into());
                break;
            }
        }
    }

    match broadcast_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
