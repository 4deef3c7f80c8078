//! Hash families used for proposal and envelope digests.
//!
//! The algorithm is never chosen by the SDK itself: it comes from the
//! `security.hash_algorithm` / `security.level` configuration pair.

use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a family/level pair has no matching algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported hash algorithm: {family} at security level {level}")]
pub struct UnsupportedAlgorithm {
    pub family: String,
    pub level: u32,
}

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    Sha2_256,
    Sha2_384,
    Sha3_256,
    Sha3_384,
    Blake3,
}

impl HashAlgorithm {
    /// Resolve an algorithm from a family name ("SHA2", "SHA3", "BLAKE3") and a
    /// security level in bits.
    pub fn from_family(family: &str, level: u32) -> Result<Self, UnsupportedAlgorithm> {
        match (family.to_ascii_uppercase().as_str(), level) {
            ("SHA2", 256) => Ok(Self::Sha2_256),
            ("SHA2", 384) => Ok(Self::Sha2_384),
            ("SHA3", 256) => Ok(Self::Sha3_256),
            ("SHA3", 384) => Ok(Self::Sha3_384),
            ("BLAKE3", 256) => Ok(Self::Blake3),
            _ => Err(UnsupportedAlgorithm {
                family: family.to_string(),
                level,
            }),
        }
    }

    /// Output size in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha2_256 | Self::Sha3_256 | Self::Blake3 => 32,
            Self::Sha2_384 | Self::Sha3_384 => 48,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha2_256 => "SHA2-256",
            Self::Sha2_384 => "SHA2-384",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Blake3 => "BLAKE3",
        };
        f.write_str(name)
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnsupportedAlgorithm;

    /// Parse the display form, e.g. "SHA2-256".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((family, level)) => {
                let level = level.parse().map_err(|_| UnsupportedAlgorithm {
                    family: family.to_string(),
                    level: 0,
                })?;
                Self::from_family(family, level)
            }
            None => Self::from_family(s, 256),
        }
    }
}

/// A message digest of variable length.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Digest(pub Vec<u8>);

impl Digest {
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Digest(0x{})", &hex[..hex.len().min(8)])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data with the given algorithm.
pub fn hash(data: &[u8], algorithm: HashAlgorithm) -> Digest {
    hash_concat(&[data], algorithm)
}

/// Hash multiple pieces of data as if they were concatenated.
pub fn hash_concat(parts: &[&[u8]], algorithm: HashAlgorithm) -> Digest {
    let bytes = match algorithm {
        HashAlgorithm::Sha2_256 => {
            let mut hasher = sha2::Sha256::new();
            parts.iter().for_each(|p| hasher.update(p));
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha2_384 => {
            let mut hasher = sha2::Sha384::new();
            parts.iter().for_each(|p| hasher.update(p));
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha3_256 => {
            let mut hasher = sha3::Sha3_256::new();
            parts.iter().for_each(|p| hasher.update(p));
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha3_384 => {
            let mut hasher = sha3::Sha3_384::new();
            parts.iter().for_each(|p| hasher.update(p));
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().as_bytes().to_vec()
        }
    };
    Digest(bytes)
}
