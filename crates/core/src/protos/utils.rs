//! Helpers for building and unpacking proposals.

use super::common::{ChannelHeader, Header, HeaderType, SerializedIdentity, SignatureHeader};
use super::peer::{
    ChaincodeAction, ChaincodeHeaderExtension, ChaincodeInvocationSpec, ChaincodeProposalPayload,
    Proposal, ProposalResponsePayload,
};
use super::{decode, encode, ProtoError, Result};
use crate::crypto::{self, CryptoSuite, HashOpts};
use rand::RngCore;
use std::collections::BTreeMap;

/// Nonce length in bytes.
pub const NONCE_SIZE: usize = 24;

/// Generate a fresh random nonce.
pub fn random_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Encode a creator identity: membership-provider id plus certificate bytes.
pub fn serialize_identity(msp_id: &str, certificate: &[u8]) -> Result<Vec<u8>> {
    let identity = SerializedIdentity {
        msp_id: msp_id.to_string(),
        id_bytes: certificate.to_vec(),
    };
    encode("serialized identity", &identity)
}

/// Transaction id: hex digest of `nonce || creator`.
///
/// The same nonce and creator always yield the same id.
pub fn compute_tx_id(
    nonce: &[u8],
    creator: &[u8],
    suite: &dyn CryptoSuite,
) -> crypto::Result<String> {
    let mut material = Vec::with_capacity(nonce.len() + creator.len());
    material.extend_from_slice(nonce);
    material.extend_from_slice(creator);
    Ok(suite.hash(&material, &HashOpts::default())?.to_hex())
}

/// Build an unsigned chaincode proposal.
pub fn create_chaincode_proposal(
    header_type: HeaderType,
    channel_id: &str,
    spec: &ChaincodeInvocationSpec,
    creator: &[u8],
    transient_map: BTreeMap<String, Vec<u8>>,
    nonce: Vec<u8>,
    tx_id: &str,
) -> Result<Proposal> {
    let extension = ChaincodeHeaderExtension {
        payload_visibility: Vec::new(),
        chaincode_id: spec.chaincode_spec.chaincode_id.clone(),
    };
    let channel_header = ChannelHeader {
        header_type,
        version: 0,
        channel_id: channel_id.to_string(),
        tx_id: tx_id.to_string(),
        epoch: 0,
        extension: encode("chaincode header extension", &extension)?,
    };
    let signature_header = SignatureHeader {
        creator: creator.to_vec(),
        nonce,
    };
    let header = Header {
        channel_header: encode("channel header", &channel_header)?,
        signature_header: encode("signature header", &signature_header)?,
    };
    let payload = ChaincodeProposalPayload {
        input: encode("chaincode invocation spec", spec)?,
        transient_map,
    };

    Ok(Proposal {
        header: encode("header", &header)?,
        payload: encode("chaincode proposal payload", &payload)?,
        extension: Vec::new(),
    })
}

pub fn get_header(bytes: &[u8]) -> Result<Header> {
    decode("header", bytes)
}

pub fn get_channel_header(header: &Header) -> Result<ChannelHeader> {
    decode("channel header", &header.channel_header)
}

pub fn get_signature_header(header: &Header) -> Result<SignatureHeader> {
    decode("signature header", &header.signature_header)
}

/// Decode the chaincode extension carried in a header's channel half.
pub fn get_chaincode_header_extension(header: &Header) -> Result<ChaincodeHeaderExtension> {
    let channel_header = get_channel_header(header)?;
    decode("chaincode header extension", &channel_header.extension)
}

pub fn get_chaincode_proposal_payload(bytes: &[u8]) -> Result<ChaincodeProposalPayload> {
    decode("chaincode proposal payload", bytes)
}

pub fn get_proposal_response_payload(bytes: &[u8]) -> Result<ProposalResponsePayload> {
    decode("proposal response payload", bytes)
}

pub fn get_chaincode_action(bytes: &[u8]) -> Result<ChaincodeAction> {
    decode("chaincode action", bytes)
}

/// Encode the response payload an endorser returns for a simulated action.
pub fn create_proposal_response_payload(
    proposal_hash: Vec<u8>,
    action: &ChaincodeAction,
) -> Result<Vec<u8>> {
    let payload = ProposalResponsePayload {
        proposal_hash,
        extension: encode("chaincode action", action)?,
    };
    encode("proposal response payload", &payload)
}

/// Bytes of the proposal payload allowed to travel in the final transaction.
///
/// Only full visibility (an empty policy) is understood: the chaincode input
/// is kept and the transient map is stripped, since transient data never
/// reaches the ledger.
pub fn proposal_payload_for_tx(
    payload: &ChaincodeProposalPayload,
    visibility: &[u8],
) -> Result<Vec<u8>> {
    if !visibility.is_empty() {
        return Err(ProtoError::UnsupportedVisibility(visibility.len()));
    }
    let visible = ChaincodeProposalPayload {
        input: payload.input.clone(),
        transient_map: BTreeMap::new(),
    };
    encode("chaincode proposal payload", &visible)
}
