//! Core primitives for the fabsdk client.
//!
//! This crate provides the building blocks the channel orchestrator uses:
//! - Hash families selectable from configuration
//! - Ed25519 keys and the `CryptoSuite` hash/sign capability
//! - The wire messages (proposals, responses, transactions, envelopes)
//! - Length-prefixed framing for peer and orderer streams

pub mod crypto;
pub mod hash;
pub mod protos;
pub mod wire;

// Re-export commonly used types at the crate root
pub use crypto::{
    CryptoError, CryptoSuite, HashOpts, Keypair, PublicKey, Signature, SignerOpts,
    SoftwareCryptoSuite,
};
pub use hash::{hash, hash_concat, Digest, HashAlgorithm, UnsupportedAlgorithm};
pub use protos::{ProtoError, STATUS_OK};
pub use wire::{read_frame, write_frame, WireError};
