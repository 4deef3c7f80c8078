//! In-memory peers and orderers for tests and offline development.
//!
//! Both count their calls so tests can assert that a fan-out touched every
//! endpoint exactly once.

use crate::error::EndpointError;
use crate::orderer::Orderer;
use crate::peer::Peer;
use async_trait::async_trait;
use fabsdk_core::protos::utils::{create_proposal_response_payload, serialize_identity};
use fabsdk_core::protos::{
    ChaincodeAction, Endorsement, Envelope, ProposalResponse, Response, SignedProposal, Status,
    STATUS_OK,
};
use fabsdk_core::{hash, HashAlgorithm, Keypair};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// A peer that endorses every proposal with a fixed outcome.
#[derive(Debug)]
pub struct MockPeer {
    url: String,
    msp_id: String,
    keypair: Keypair,
    status: i32,
    message: String,
    payload: Vec<u8>,
    error: Option<String>,
    transient_failures: AtomicUsize,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockPeer {
    /// Endorses with status 200 and an empty payload.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            msp_id: "PeerMSP".to_string(),
            keypair: Keypair::generate(),
            status: STATUS_OK,
            message: String::new(),
            payload: Vec::new(),
            error: None,
            transient_failures: AtomicUsize::new(0),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Chaincode result returned in the response and the simulated action.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Respond with a chaincode-level status instead of 200.
    pub fn with_status(mut self, status: i32, message: impl Into<String>) -> Self {
        self.status = status;
        self.message = message.into();
        self
    }

    /// Fail every call with a non-retryable endpoint error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Drop the first `count` calls as if the connection closed.
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Build the response this peer gives for `proposal`.
    ///
    /// The endorsement signs the response payload followed by the
    /// endorser identity, and is only attached to successful responses.
    pub fn endorse(&self, proposal: &SignedProposal) -> Result<ProposalResponse, EndpointError> {
        let response = Response {
            status: self.status,
            message: self.message.clone(),
            payload: self.payload.clone(),
        };
        let action = ChaincodeAction {
            results: self.payload.clone(),
            events: Vec::new(),
            response: response.clone(),
        };
        let proposal_hash = hash(&proposal.proposal_bytes, HashAlgorithm::Sha2_256);
        let payload = create_proposal_response_payload(proposal_hash.as_bytes().to_vec(), &action)
            .map_err(|e| EndpointError::Other(e.to_string()))?;

        let endorsement = if self.status == STATUS_OK {
            let endorser = serialize_identity(&self.msp_id, self.url.as_bytes())
                .map_err(|e| EndpointError::Other(e.to_string()))?;
            let mut signed = payload.clone();
            signed.extend_from_slice(&endorser);
            Some(Endorsement {
                signature: self.keypair.sign(&signed).to_vec(),
                endorser,
            })
        } else {
            None
        };

        Ok(ProposalResponse {
            version: 1,
            response,
            payload,
            endorsement,
        })
    }
}

#[async_trait]
impl Peer for MockPeer {
    fn url(&self) -> &str {
        &self.url
    }

    async fn send_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> Result<ProposalResponse, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.error {
            return Err(EndpointError::Other(message.clone()));
        }
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(EndpointError::Closed);
        }
        self.endorse(proposal)
    }
}

/// An orderer that records every envelope and answers with a fixed status.
#[derive(Debug)]
pub struct MockOrderer {
    url: String,
    status: Status,
    error: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    received: Mutex<Vec<Envelope>>,
}

impl MockOrderer {
    /// Acknowledges every broadcast with `SUCCESS`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Status::Success,
            error: None,
            delay: None,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Fail every call before the envelope is accepted.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Envelopes accepted so far, in arrival order.
    pub async fn received(&self) -> Vec<Envelope> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Orderer for MockOrderer {
    fn url(&self) -> &str {
        &self.url
    }

    async fn send_broadcast(&self, envelope: &Envelope) -> Result<(), EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.error {
            return Err(EndpointError::Other(message.clone()));
        }
        self.received.lock().await.push(envelope.clone());
        if self.status.is_success() {
            Ok(())
        } else {
            Err(EndpointError::BroadcastStatus(self.status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_peer_endorses() {
        let peer = MockPeer::new("peer0:7051").with_payload("42");
        let response = peer.send_proposal(&SignedProposal::default()).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.response.payload, b"42");
        let endorsement = response.endorsement.unwrap();
        assert_eq!(endorsement.signature.len(), 64);
        assert_eq!(peer.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_peer_rejection_has_no_endorsement() {
        let peer = MockPeer::new("peer0:7051").with_status(500, "bad");
        let response = peer.send_proposal(&SignedProposal::default()).await.unwrap();
        assert_eq!(response.status(), 500);
        assert!(response.endorsement.is_none());
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let peer = MockPeer::new("peer0:7051").with_transient_failures(2);
        let proposal = SignedProposal::default();
        assert!(matches!(
            peer.send_proposal(&proposal).await,
            Err(EndpointError::Closed)
        ));
        assert!(peer.send_proposal(&proposal).await.is_err());
        assert!(peer.send_proposal(&proposal).await.is_ok());
        assert_eq!(peer.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_orderer_records_envelopes() {
        let orderer = MockOrderer::new("orderer:7050");
        let envelope = Envelope {
            payload: b"p".to_vec(),
            signature: b"s".to_vec(),
        };
        orderer.send_broadcast(&envelope).await.unwrap();
        assert_eq!(orderer.received().await, vec![envelope]);

        let rejecting = MockOrderer::new("orderer:7050").with_status(Status::Forbidden);
        assert!(matches!(
            rejecting.send_broadcast(&Envelope::default()).await,
            Err(EndpointError::BroadcastStatus(Status::Forbidden))
        ));
    }
}
