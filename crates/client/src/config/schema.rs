//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every section has defaults so a minimal file only names the endpoints.

use fabsdk_core::{HashAlgorithm, UnsupportedAlgorithm};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the SDK.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SdkConfig {
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub tcert: TcertConfig,
    pub tls: TlsConfig,
    pub msp: MspConfig,
    pub keystore: KeystoreConfig,

    /// Endorsing peers.
    pub peers: Vec<PeerConfig>,

    /// Ordering nodes.
    pub orderers: Vec<OrdererConfig>,

    pub timeouts: TimeoutConfig,
    pub retry: RetryConfig,
}

impl SdkConfig {
    /// Resolve the configured hash algorithm.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, UnsupportedAlgorithm> {
        HashAlgorithm::from_family(&self.security.hash_algorithm, self.security.level)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the SDK's log targets (e.g. "info", "debug").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enabled: bool,
    /// Hash family: "SHA2", "SHA3" or "BLAKE3".
    pub hash_algorithm: String,
    /// Security level in bits (256 or 384).
    pub level: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hash_algorithm: "SHA2".to_string(),
            level: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TcertConfig {
    /// Number of transaction certificates fetched per batch.
    pub batch_size: u32,
}

impl Default for TcertConfig {
    fn default() -> Self {
        Self { batch_size: 200 }
    }
}

/// Transport security for peer and orderer connections.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,

    /// CA bundle (PEM) used to verify endpoint certificates.
    pub ca_certificate: Option<PathBuf>,

    /// Name to verify endpoint certificates against instead of the host.
    pub server_host_override: Option<String>,

    /// Client certificate (PEM) for mutual TLS.
    pub client_certificate: Option<PathBuf>,

    /// Client private key (PEM) for mutual TLS.
    pub client_key: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MspConfig {
    /// Membership-service provider id put into every creator identity.
    pub id: String,
}

impl Default for MspConfig {
    fn default() -> Self {
        Self {
            id: "Org1MSP".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Directory of the user state store.
    pub path: PathBuf,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/enroll_user"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerConfig {
    pub host: String,
    pub port: u16,

    /// Event-source endpoint of this peer, if it serves events.
    #[serde(default)]
    pub event_host: Option<String>,
    #[serde(default)]
    pub event_port: Option<u16>,
}

impl PeerConfig {
    /// "host:port" of the endorser endpoint.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdererConfig {
    pub host: String,
    pub port: u16,
}

impl OrdererConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on establishing a connection to any endpoint.
    pub connect_secs: u64,

    /// Bound on waiting for orderer acknowledgements. None waits for
    /// end-of-stream indefinitely.
    pub ack_secs: Option<u64>,

    /// Bound on a peer's proposal round trip. None waits indefinitely.
    pub peer_request_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 3,
            ack_secs: None,
            peer_request_secs: None,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn ack(&self) -> Option<Duration> {
        self.ack_secs.map(Duration::from_secs)
    }

    pub fn peer_request(&self) -> Option<Duration> {
        self.peer_request_secs.map(Duration::from_secs)
    }
}

/// Backoff used when a caller asks for retries.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}
