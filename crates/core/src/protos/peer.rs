//! Endorsement-side messages: proposals, responses and transactions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Endorsement success status.
pub const STATUS_OK: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChaincodeType {
    #[default]
    Golang,
    Node,
    Java,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeId {
    pub name: String,
    pub version: String,
}

impl ChaincodeId {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
        }
    }
}

/// Positional chaincode arguments as raw byte strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeInput {
    pub args: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeSpec {
    pub chaincode_type: ChaincodeType,
    pub chaincode_id: ChaincodeId,
    pub input: ChaincodeInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeInvocationSpec {
    pub chaincode_spec: ChaincodeSpec,
}

impl ChaincodeInvocationSpec {
    /// Build an invocation of `chaincode` with string arguments.
    pub fn new<S: AsRef<str>>(chaincode: &str, args: &[S]) -> Self {
        let args = args.iter().map(|a| a.as_ref().as_bytes().to_vec()).collect();
        Self {
            chaincode_spec: ChaincodeSpec {
                chaincode_type: ChaincodeType::Golang,
                chaincode_id: ChaincodeId::named(chaincode),
                input: ChaincodeInput { args },
            },
        }
    }
}

/// Carried in `ChannelHeader::extension` for chaincode transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeHeaderExtension {
    /// Which parts of the proposal payload may reach the ledger. Empty
    /// means full visibility.
    pub payload_visibility: Vec<u8>,
    pub chaincode_id: ChaincodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeProposalPayload {
    /// Encoded `ChaincodeInvocationSpec`.
    pub input: Vec<u8>,
    /// Data passed to the chaincode but never written to the ledger.
    pub transient_map: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proposal {
    /// Encoded `Header`.
    pub header: Vec<u8>,
    /// Encoded `ChaincodeProposalPayload`.
    pub payload: Vec<u8>,
    pub extension: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedProposal {
    /// Encoded `Proposal`; the signature covers exactly these bytes.
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Application-level verdict of the chaincode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            payload: payload.into(),
        }
    }

    pub fn error(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: Vec::new(),
        }
    }
}

/// An endorser's signature plus its identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endorsement {
    /// Encoded `SerializedIdentity` of the endorser.
    pub endorser: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub version: i32,
    pub response: Response,
    /// Encoded `ProposalResponsePayload`.
    pub payload: Vec<u8>,
    /// Present when the endorser approved the proposal.
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    pub fn status(&self) -> i32 {
        self.response.status
    }

    pub fn is_success(&self) -> bool {
        self.response.status == STATUS_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalResponsePayload {
    pub proposal_hash: Vec<u8>,
    /// Encoded `ChaincodeAction`.
    pub extension: Vec<u8>,
}

/// Simulation outcome produced by an endorser.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeAction {
    pub results: Vec<u8>,
    pub events: Vec<u8>,
    pub response: Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeEndorsedAction {
    /// Canonical `ProposalResponsePayload` bytes.
    pub proposal_response_payload: Vec<u8>,
    pub endorsements: Vec<Endorsement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChaincodeActionPayload {
    /// Proposal payload after the visibility policy was applied.
    pub chaincode_proposal_payload: Vec<u8>,
    pub action: ChaincodeEndorsedAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionAction {
    /// The proposal's `SignatureHeader` bytes, copied unchanged.
    pub header: Vec<u8>,
    /// Encoded `ChaincodeActionPayload`.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub actions: Vec<TransactionAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_spec_args() {
        let spec = ChaincodeInvocationSpec::new("end2end", &["invoke", "move", "a"]);
        assert_eq!(spec.chaincode_spec.chaincode_id.name, "end2end");
        assert_eq!(
            spec.chaincode_spec.input.args,
            vec![b"invoke".to_vec(), b"move".to_vec(), b"a".to_vec()]
        );
    }

    #[test]
    fn test_invocation_spec_without_args() {
        let spec = ChaincodeInvocationSpec::new::<&str>("noargs", &[]);
        assert!(spec.chaincode_spec.input.args.is_empty());
    }

    #[test]
    fn test_response_status() {
        let ok = ProposalResponse {
            response: Response::ok(b"42".to_vec()),
            ..Default::default()
        };
        assert!(ok.is_success());

        let bad = ProposalResponse {
            response: Response::error(500, "bad"),
            ..Default::default()
        };
        assert!(!bad.is_success());
        assert_eq!(bad.status(), 500);
    }
}
