//! Wire messages exchanged with peers and orderers.
//!
//! Messages that are signed travel as opaque byte fields (`Vec<u8>`) inside
//! their parents so a signature always covers the exact bytes that were
//! produced at signing time; nothing is ever re-serialized before checking.
//! All messages are encoded with bincode, and every map is a `BTreeMap`, so
//! the same message always encodes to the same bytes.

pub mod common;
pub mod peer;
pub mod utils;

pub use common::{
    BroadcastResponse, ChannelHeader, Envelope, Header, HeaderType, Payload, SerializedIdentity,
    SignatureHeader, Status,
};
pub use peer::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeHeaderExtension,
    ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec,
    ChaincodeType, Endorsement, Proposal, ProposalResponse, ProposalResponsePayload, Response,
    SignedProposal, Transaction, TransactionAction, STATUS_OK,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("could not marshal {what}: {source}")]
    Marshal {
        what: &'static str,
        #[source]
        source: bincode::Error,
    },

    #[error("could not unmarshal {what}: {source}")]
    Unmarshal {
        what: &'static str,
        #[source]
        source: bincode::Error,
    },

    #[error("unsupported payload visibility ({0} bytes)")]
    UnsupportedVisibility(usize),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtoError>;

/// Encode a message. `what` names the message in errors.
pub fn encode<T: Serialize>(what: &'static str, message: &T) -> Result<Vec<u8>> {
    bincode::serialize(message).map_err(|source| ProtoError::Marshal { what, source })
}

/// Decode a message. `what` names the message in errors.
pub fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|source| ProtoError::Unmarshal { what, source })
}
