//! Envelope-level messages shared by every transaction type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content carried by a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeaderType {
    /// Endorsed chaincode transaction.
    #[default]
    EndorserTransaction,
    /// A signed proposal forwarded through ordering to be endorsed on commit.
    Invocation,
}

/// Channel-scoped part of a header.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub header_type: HeaderType,
    pub version: i32,
    pub channel_id: String,
    pub tx_id: String,
    pub epoch: u64,
    /// Type-specific extension, e.g. an encoded `ChaincodeHeaderExtension`.
    pub extension: Vec<u8>,
}

/// Creator identity and anti-replay nonce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Encoded `SerializedIdentity` of the creator.
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Both header halves, kept as the bytes that were signed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    pub channel_header: Vec<u8>,
    pub signature_header: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payload {
    pub header: Header,
    pub data: Vec<u8>,
}

/// Signed wire unit sent to the ordering service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Encoded `Payload`.
    pub payload: Vec<u8>,
    /// Signature over `payload`.
    pub signature: Vec<u8>,
}

/// Membership-provider id plus raw certificate bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub msp_id: String,
    pub id_bytes: Vec<u8>,
}

/// Status codes reported by the ordering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Unknown,
    Success,
    BadRequest,
    Forbidden,
    NotFound,
    RequestEntityTooLarge,
    InternalServerError,
    ServiceUnavailable,
}

impl Status {
    /// HTTP-style numeric code.
    pub fn code(&self) -> i32 {
        match self {
            Status::Unknown => 0,
            Status::Success => 200,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::RequestEntityTooLarge => 413,
            Status::InternalServerError => 500,
            Status::ServiceUnavailable => 503,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            200 => Status::Success,
            400 => Status::BadRequest,
            403 => Status::Forbidden,
            404 => Status::NotFound,
            413 => Status::RequestEntityTooLarge,
            500 => Status::InternalServerError,
            503 => Status::ServiceUnavailable,
            _ => Status::Unknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Unknown => "UNKNOWN",
            Status::Success => "SUCCESS",
            Status::BadRequest => "BAD_REQUEST",
            Status::Forbidden => "FORBIDDEN",
            Status::NotFound => "NOT_FOUND",
            Status::RequestEntityTooLarge => "REQUEST_ENTITY_TOO_LARGE",
            Status::InternalServerError => "INTERNAL_SERVER_ERROR",
            Status::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// One acknowledgement on the broadcast stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub status: Status,
    pub info: String,
}

impl BroadcastResponse {
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            info: String::new(),
        }
    }
}
