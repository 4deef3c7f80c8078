//! Channel orchestration: build and sign proposals, collect endorsements
//! from peers, assemble transactions and broadcast them to orderers.
//!
//! # Transaction flow
//! ```text
//! create_transaction_proposal ──▶ (SignedProposal, Proposal, tx_id)
//!            │
//! send_transaction_proposal   ──▶ one response per peer (concurrent)
//!            │
//! create_transaction          ──▶ Transaction (endorsements in input order)
//!            │
//! send_transaction            ──▶ one result per orderer (concurrent)
//! ```
//!
//! Peer and orderer sets are read when a fan-out starts; changing them
//! afterwards does not affect calls already in flight.

use crate::context::{Client, User};
use crate::error::{ChannelError, Result};
use crate::orderer::Orderer;
use crate::peer::Peer;
use crate::policy::{AcceptAll, EndorsementPolicy};
use crate::response::{
    ensure_accepted, fan_out, TransactionProposalResponse, TransactionResponse,
};
use crate::retry::{with_retries, RetryPolicy};
use fabsdk_core::protos::utils::{
    self, compute_tx_id, create_chaincode_proposal, random_nonce, serialize_identity,
};
use fabsdk_core::protos::{
    encode, ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeInvocationSpec,
    ChannelHeader, Envelope, Header, HeaderType, Payload, Proposal, ProposalResponse,
    SignatureHeader, SignedProposal, Transaction, TransactionAction,
};
use fabsdk_core::{HashOpts, Keypair, SignerOpts};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub struct Channel {
    name: String,
    security_enabled: bool,
    peers: HashMap<String, Arc<dyn Peer>>,
    orderers: HashMap<String, Arc<dyn Orderer>>,
    tcert_batch_size: u32,
    endorsement_policy: Arc<dyn EndorsementPolicy>,
    client: Arc<Client>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut peers: Vec<_> = self.peers.keys().collect();
        peers.sort();
        let mut orderers: Vec<_> = self.orderers.keys().collect();
        orderers.sort();
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("security_enabled", &self.security_enabled)
            .field("peers", &peers)
            .field("orderers", &orderers)
            .field("tcert_batch_size", &self.tcert_batch_size)
            .field("endorsement_policy", &self.endorsement_policy)
            .finish()
    }
}

impl Channel {
    /// Create a channel with no peers or orderers.
    ///
    /// Security and tcert batch size come from the client configuration.
    pub fn new(name: &str, client: Arc<Client>) -> Result<Self> {
        if name.is_empty() {
            return Err(ChannelError::InvalidArgument(
                "failed to create channel: missing name".into(),
            ));
        }
        let config = client.config();
        let channel = Self {
            name: name.to_string(),
            security_enabled: config.security.enabled,
            peers: HashMap::new(),
            orderers: HashMap::new(),
            tcert_batch_size: config.tcert.batch_size,
            endorsement_policy: Arc::new(AcceptAll),
            client,
        };
        tracing::info!(
            channel = %channel.name,
            security = channel.security_enabled,
            "Constructed channel instance"
        );
        Ok(channel)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_security_enabled(&self) -> bool {
        self.security_enabled
    }

    pub fn tcert_batch_size(&self) -> u32 {
        self.tcert_batch_size
    }

    pub fn set_tcert_batch_size(&mut self, batch_size: u32) {
        self.tcert_batch_size = batch_size;
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Replace the check applied to responses in [`Channel::create_transaction`].
    pub fn set_endorsement_policy(&mut self, policy: Arc<dyn EndorsementPolicy>) {
        self.endorsement_policy = policy;
    }

    /// Add a peer, replacing any peer already registered at the same URL.
    pub fn add_peer(&mut self, peer: Arc<dyn Peer>) {
        self.peers.insert(peer.url().to_string(), peer);
    }

    /// Remove the peer registered at `url`. Unknown URLs are ignored.
    pub fn remove_peer(&mut self, url: &str) -> Option<Arc<dyn Peer>> {
        self.peers.remove(url)
    }

    pub fn peers(&self) -> Vec<Arc<dyn Peer>> {
        self.peers.values().cloned().collect()
    }

    /// Add an orderer, replacing any orderer already registered at the same URL.
    pub fn add_orderer(&mut self, orderer: Arc<dyn Orderer>) {
        self.orderers.insert(orderer.url().to_string(), orderer);
    }

    /// Remove the orderer registered at `url`. Unknown URLs are ignored.
    pub fn remove_orderer(&mut self, url: &str) -> Option<Arc<dyn Orderer>> {
        self.orderers.remove(url)
    }

    pub fn orderers(&self) -> Vec<Arc<dyn Orderer>> {
        self.orderers.values().cloned().collect()
    }

    /// Build and sign a proposal invoking `chaincode` with `args`.
    ///
    /// Returns the signed proposal, the unsigned proposal it wraps and the
    /// transaction id. A fresh nonce is drawn for every call.
    pub fn create_transaction_proposal<S: AsRef<str>>(
        &self,
        chaincode: &str,
        channel_id: &str,
        args: &[S],
        sign: bool,
        transient_map: BTreeMap<String, Vec<u8>>,
    ) -> Result<(SignedProposal, Proposal, String)> {
        self.create_transaction_proposal_with_nonce(
            chaincode,
            channel_id,
            args,
            sign,
            transient_map,
            random_nonce(),
        )
    }

    /// Same as [`Channel::create_transaction_proposal`] with a caller-chosen
    /// nonce. Equal inputs and nonce produce byte-identical output.
    ///
    /// With `sign == false` the signed proposal carries an empty signature.
    pub fn create_transaction_proposal_with_nonce<S: AsRef<str>>(
        &self,
        chaincode: &str,
        channel_id: &str,
        args: &[S],
        sign: bool,
        transient_map: BTreeMap<String, Vec<u8>>,
        nonce: Vec<u8>,
    ) -> Result<(SignedProposal, Proposal, String)> {
        if chaincode.is_empty() {
            return Err(ChannelError::InvalidArgument("missing chaincode name".into()));
        }

        let user = self.client.user_context("")?;
        let creator = self.creator_identity(&user)?;
        let spec = ChaincodeInvocationSpec::new(chaincode, args);
        let tx_id = compute_tx_id(&nonce, &creator, self.client.crypto_suite())?;

        let proposal = create_chaincode_proposal(
            HeaderType::EndorserTransaction,
            channel_id,
            &spec,
            &creator,
            transient_map,
            nonce,
            &tx_id,
        )?;
        let proposal_bytes = encode("proposal", &proposal)?;
        let signature = if sign {
            self.sign_object_with_key(&proposal_bytes, user.keypair())?
        } else {
            Vec::new()
        };

        tracing::debug!(
            channel = %self.name,
            tx_id = %tx_id,
            chaincode,
            "Created transaction proposal"
        );
        Ok((
            SignedProposal {
                proposal_bytes,
                signature,
            },
            proposal,
            tx_id,
        ))
    }

    /// Send a signed proposal to every peer concurrently.
    ///
    /// `retry` is the number of extra attempts each peer gets after a
    /// retryable transport failure. Per-peer failures are returned inside
    /// the map; the call only fails on a bad argument.
    pub async fn send_transaction_proposal(
        &self,
        proposal: &SignedProposal,
        retry: u32,
    ) -> Result<HashMap<String, TransactionProposalResponse>> {
        if self.peers.is_empty() {
            return Err(ChannelError::InvalidArgument("peers is nil or empty".into()));
        }
        if proposal.proposal_bytes.is_empty() {
            return Err(ChannelError::InvalidArgument("signed proposal is empty".into()));
        }

        let policy = RetryPolicy::new(retry, self.client.config().retry);
        let proposal = Arc::new(proposal.clone());
        let peers: Vec<_> = self
            .peers
            .iter()
            .map(|(url, peer)| (url.clone(), Arc::clone(peer)))
            .collect();

        let results = fan_out(peers, |peer: Arc<dyn Peer>| {
            let proposal = Arc::clone(&proposal);
            async move {
                let outcome =
                    with_retries(policy, peer.url(), || peer.send_proposal(&proposal)).await;
                match &outcome {
                    Ok(response) => log_endorsement(peer.url(), response),
                    Err(e) => {
                        tracing::error!(endorser = peer.url(), error = %e, "Error calling endorser")
                    }
                }
                outcome
            }
        })
        .await;

        Ok(results
            .into_iter()
            .map(|(endorser, result)| {
                let record = TransactionProposalResponse {
                    endorser: endorser.clone(),
                    result,
                };
                (endorser, record)
            })
            .collect())
    }

    /// Assemble a transaction from a proposal and its endorsements.
    ///
    /// Every response must be successful. The first response's payload is
    /// the one committed; endorsements keep the order of `responses`.
    pub fn create_transaction(
        &self,
        proposal: &Proposal,
        responses: &[ProposalResponse],
    ) -> Result<Transaction> {
        if responses.is_empty() {
            return Err(ChannelError::NoEndorsements);
        }
        for response in responses {
            if !response.is_success() {
                return Err(ChannelError::EndorsementRejected {
                    status: response.status(),
                    message: response.response.message.clone(),
                });
            }
        }
        self.endorsement_policy.evaluate(responses)?;

        let header = utils::get_header(&proposal.header)?;
        let proposal_payload = utils::get_chaincode_proposal_payload(&proposal.payload)?;
        let extension = utils::get_chaincode_header_extension(&header)?;

        let endorsements = responses
            .iter()
            .enumerate()
            .map(|(i, response)| {
                response.endorsement.clone().ok_or_else(|| {
                    ChannelError::InvalidArgument(format!(
                        "proposal response {} carries no endorsement",
                        i
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let endorsed_action = ChaincodeEndorsedAction {
            proposal_response_payload: responses[0].payload.clone(),
            endorsements,
        };
        let chaincode_proposal_payload =
            utils::proposal_payload_for_tx(&proposal_payload, &extension.payload_visibility)?;
        let action_payload = ChaincodeActionPayload {
            chaincode_proposal_payload,
            action: endorsed_action,
        };

        Ok(Transaction {
            actions: vec![TransactionAction {
                header: header.signature_header,
                payload: encode("chaincode action payload", &action_payload)?,
            }],
        })
    }

    /// Wrap a transaction in a signed envelope and broadcast it to every
    /// orderer concurrently.
    ///
    /// Succeeds when at least one orderer accepted the envelope; the map
    /// then also carries the failures of the others.
    pub async fn send_transaction(
        &self,
        proposal: &Proposal,
        transaction: &Transaction,
    ) -> Result<HashMap<String, TransactionResponse>> {
        if self.orderers.is_empty() {
            return Err(ChannelError::InvalidArgument("orderers is nil or empty".into()));
        }
        if proposal.header.is_empty() {
            return Err(ChannelError::InvalidArgument("proposal is empty".into()));
        }
        if transaction.actions.is_empty() {
            return Err(ChannelError::InvalidArgument("transaction has no actions".into()));
        }

        let header = utils::get_header(&proposal.header)?;
        let payload = Payload {
            header,
            data: encode("transaction", transaction)?,
        };
        let envelope = self.sign_payload(&payload)?;

        let responses = self.broadcast_envelope(&envelope).await?;
        ensure_accepted(&responses)?;
        Ok(responses)
    }

    /// Build an envelope that carries a signed proposal through ordering
    /// instead of collecting endorsements first.
    pub fn create_invocation_transaction<S: AsRef<str>>(
        &self,
        chaincode: &str,
        channel_id: &str,
        args: &[S],
        transient_map: BTreeMap<String, Vec<u8>>,
    ) -> Result<(Envelope, String)> {
        let user = self.client.user_context("")?;
        let creator = self.creator_identity(&user)?;
        let (signed_proposal, _, tx_id) =
            self.create_transaction_proposal(chaincode, channel_id, args, true, transient_map)?;

        let channel_header = ChannelHeader {
            header_type: HeaderType::Invocation,
            channel_id: channel_id.to_string(),
            tx_id: tx_id.clone(),
            ..Default::default()
        };
        let signature_header = SignatureHeader {
            creator,
            nonce: random_nonce(),
        };
        let payload = Payload {
            header: Header {
                channel_header: encode("channel header", &channel_header)?,
                signature_header: encode("signature header", &signature_header)?,
            },
            data: encode("signed proposal", &signed_proposal)?,
        };

        Ok((self.sign_payload(&payload)?, tx_id))
    }

    /// Broadcast an invocation envelope; fails only if every orderer failed.
    pub async fn send_invocation_transaction(&self, envelope: &Envelope) -> Result<()> {
        let responses = self.broadcast_envelope(envelope).await?;
        ensure_accepted(&responses)
    }

    /// Send one envelope to every orderer concurrently and collect the
    /// per-orderer outcome.
    pub async fn broadcast_envelope(
        &self,
        envelope: &Envelope,
    ) -> Result<HashMap<String, TransactionResponse>> {
        if self.orderers.is_empty() {
            return Err(ChannelError::InvalidArgument("orderers is nil or empty".into()));
        }
        if envelope.payload.is_empty() {
            return Err(ChannelError::InvalidArgument("envelope is empty".into()));
        }

        let envelope = Arc::new(envelope.clone());
        let orderers: Vec<_> = self
            .orderers
            .iter()
            .map(|(url, orderer)| (url.clone(), Arc::clone(orderer)))
            .collect();

        let results = fan_out(orderers, |orderer: Arc<dyn Orderer>| {
            let envelope = Arc::clone(&envelope);
            async move {
                let outcome = orderer.send_broadcast(&envelope).await;
                if outcome.is_ok() {
                    tracing::debug!(orderer = orderer.url(), "Broadcast accepted");
                }
                outcome
            }
        })
        .await;

        Ok(results
            .into_iter()
            .map(|(orderer, result)| {
                let record = TransactionResponse {
                    orderer: orderer.clone(),
                    result,
                };
                (orderer, record)
            })
            .collect())
    }

    fn creator_identity(&self, user: &User) -> Result<Vec<u8>> {
        Ok(serialize_identity(
            &self.client.config().msp.id,
            user.enrollment_certificate(),
        )?)
    }

    fn sign_payload(&self, payload: &Payload) -> Result<Envelope> {
        let user = self.client.user_context("")?;
        let payload = encode("payload", payload)?;
        let signature = self.sign_object_with_key(&payload, user.keypair())?;
        Ok(Envelope { payload, signature })
    }

    /// Hash `object` with the suite's default algorithm and sign the digest.
    fn sign_object_with_key(&self, object: &[u8], key: &Keypair) -> Result<Vec<u8>> {
        let suite = self.client.crypto_suite();
        let digest = suite.hash(object, &HashOpts::default())?;
        Ok(suite.sign(key, &digest, &SignerOpts)?.to_vec())
    }
}

fn log_endorsement(endorser: &str, response: &ProposalResponse) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let action = utils::get_proposal_response_payload(&response.payload)
        .and_then(|payload| utils::get_chaincode_action(&payload.extension));
    match action {
        Ok(action) => tracing::debug!(
            endorser,
            status = response.status(),
            results = %String::from_utf8_lossy(&action.results),
            "Endorser response"
        ),
        Err(_) => tracing::debug!(endorser, status = response.status(), "Endorser response"),
    }
}
