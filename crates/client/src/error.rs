//! Error types for channel operations and endpoint calls.
//!
//! [`EndpointError`] is always scoped to one peer or orderer and is captured
//! into fan-out results. [`ChannelError`] is what an operation itself fails
//! with: precondition violations, assembly failures, or a broadcast that no
//! orderer accepted.

use fabsdk_core::protos::Status;
use fabsdk_core::{CryptoError, ProtoError, WireError};
use std::time::Duration;
use thiserror::Error;

/// Failure talking to a single peer or orderer.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("stream error: {0}")]
    Wire(#[from] WireError),

    #[error("stream closed before a response was received")]
    Closed,

    #[error("broadcast response is not success: {0}")]
    BroadcastStatus(Status),

    #[error("endpoint task failed: {0}")]
    TaskFailed(String),

    #[error("{0}")]
    Other(String),
}

impl EndpointError {
    /// Whether another attempt could succeed.
    ///
    /// Connection-level failures are retryable; an explicit rejection from
    /// the orderer is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            EndpointError::Connection { .. }
            | EndpointError::Timeout(_)
            | EndpointError::Closed => true,
            EndpointError::Wire(e) => e.is_fatal(),
            EndpointError::Tls(_)
            | EndpointError::BroadcastStatus(_)
            | EndpointError::TaskFailed(_)
            | EndpointError::Other(_) => false,
        }
    }
}

/// Errors returned by channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no signing identity available: {0}")]
    IdentityUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] ProtoError),

    #[error("signing error: {0}")]
    Signing(#[from] CryptoError),

    #[error("error calling '{endpoint}': {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: EndpointError,
    },

    #[error("invalid TLS configuration: {0}")]
    TlsSetup(#[source] EndpointError),

    #[error("proposal response was not successful, error code {status}, msg {message}")]
    EndorsementRejected { status: i32, message: String },

    #[error("at least one proposal response is necessary")]
    NoEndorsements,

    #[error("endorsement policy not satisfied: {0}")]
    EndorsementMismatch(String),

    #[error(
        "broadcast failed: received error from all configured orderers ({})",
        .failures.join("; ")
    )]
    BroadcastRejected { failures: Vec<String> },

    #[error("state store error: {0}")]
    Storage(#[from] fabsdk_storage::StorageError),

    #[error("user record error: {0}")]
    UserRecord(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
