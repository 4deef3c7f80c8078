//! Ed25519 signing primitives and the crypto suite capability.
//!
//! The channel never touches key material directly: it asks a [`CryptoSuite`]
//! to hash a message and to sign the resulting digest with the caller's key.

use crate::hash::{hash, Digest, HashAlgorithm};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// A cryptographic signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Parse a signature from a byte slice (as carried in wire messages).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self(arr))
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// A public key for signature verification.
#[derive(Clone)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    /// Parse a public key from its 32-byte encoding.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Verify a signature against this public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let sig = DalekSignature::from_bytes(&signature.0);
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0.as_bytes()[..8]))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes() == other.0.as_bytes()
    }
}

impl Eq for PublicKey {}

/// A keypair for signing and verification.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            public_key: PublicKey(verifying_key),
        }
    }

    /// Create a keypair from a private key (32 bytes).
    pub fn from_private_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            public_key: PublicKey(verifying_key),
        }
    }

    /// Create a keypair from a hex-encoded private key.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_private_key(&arr))
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature(sig.to_bytes())
    }

    /// Verify a signature against our public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.public_key.verify(message, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Per-call hashing options. `None` means the suite's configured default.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashOpts {
    pub algorithm: Option<HashAlgorithm>,
}

impl HashOpts {
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm: Some(algorithm),
        }
    }
}

/// Per-call signing options. Ed25519 has none today.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignerOpts;

/// Hash and sign capability consumed by the channel.
pub trait CryptoSuite: Send + Sync {
    /// Hash a message.
    fn hash(&self, msg: &[u8], opts: &HashOpts) -> Result<Digest>;

    /// Sign a digest with the given key.
    fn sign(&self, key: &Keypair, digest: &Digest, opts: &SignerOpts) -> Result<Signature>;

    /// Verify a signature produced by [`CryptoSuite::sign`].
    fn verify(&self, key: &PublicKey, digest: &Digest, signature: &Signature) -> Result<()>;
}

/// Software crypto suite backed by ed25519 and the configured hash family.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareCryptoSuite {
    algorithm: HashAlgorithm,
}

impl SoftwareCryptoSuite {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The default hash algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl CryptoSuite for SoftwareCryptoSuite {
    fn hash(&self, msg: &[u8], opts: &HashOpts) -> Result<Digest> {
        Ok(hash(msg, opts.algorithm.unwrap_or(self.algorithm)))
    }

    fn sign(&self, key: &Keypair, digest: &Digest, _opts: &SignerOpts) -> Result<Signature> {
        if digest.is_empty() {
            return Err(CryptoError::Signing("empty digest".to_string()));
        }
        Ok(key.sign(digest.as_bytes()))
    }

    fn verify(&self, key: &PublicKey, digest: &Digest, signature: &Signature) -> Result<()> {
        key.verify(digest.as_bytes(), signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let kp = Keypair::generate();
        let message = b"hello world";
        let sig = kp.sign(message);
        assert!(kp.verify(message, &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello");
        assert!(kp.verify(b"world", &sig).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"hello");
        assert!(kp2.verify(b"hello", &sig).is_err());
    }

    #[test]
    fn test_keypair_from_private_key() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::from_private_key(&kp1.private_key());
        assert_eq!(kp1.public_key, kp2.public_key);

        let kp3 = Keypair::from_hex(&hex::encode(kp1.private_key())).unwrap();
        assert_eq!(kp1.public_key, kp3.public_key);
        assert!(Keypair::from_hex("abcd").is_err());
    }

    #[test]
    fn test_signature_from_slice() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"msg");
        assert_eq!(Signature::from_slice(&sig.to_vec()).unwrap(), sig);
        assert!(Signature::from_slice(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_suite_sign_digest() {
        let suite = SoftwareCryptoSuite::new(HashAlgorithm::Sha2_256);
        let kp = Keypair::generate();
        let digest = suite.hash(b"proposal bytes", &HashOpts::default()).unwrap();
        let sig = suite.sign(&kp, &digest, &SignerOpts).unwrap();
        assert!(suite.verify(&kp.public_key, &digest, &sig).is_ok());

        // Same key and digest give the same signature.
        let again = suite.sign(&kp, &digest, &SignerOpts).unwrap();
        assert_eq!(sig, again);
    }

    #[test]
    fn test_suite_hash_override() {
        let suite = SoftwareCryptoSuite::new(HashAlgorithm::Sha2_256);
        let default = suite.hash(b"x", &HashOpts::default()).unwrap();
        let overridden = suite
            .hash(b"x", &HashOpts::with_algorithm(HashAlgorithm::Sha3_384))
            .unwrap();
        assert_eq!(default.len(), 32);
        assert_eq!(overridden.len(), 48);
    }

    #[test]
    fn test_suite_rejects_empty_digest() {
        let suite = SoftwareCryptoSuite::default();
        let kp = Keypair::generate();
        let result = suite.sign(&kp, &Digest::default(), &SignerOpts);
        assert!(matches!(result, Err(CryptoError::Signing(_))));
    }
}
