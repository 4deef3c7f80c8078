//! Configuration management.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SdkConfig (validated, immutable)
//!     → shared via Arc with the client, channels and endpoints
//! ```
//!
//! Nothing here is process-global: every consumer receives the config it
//! was constructed with.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    KeystoreConfig, LoggingConfig, MspConfig, OrdererConfig, PeerConfig, RetryConfig, SdkConfig,
    SecurityConfig, TcertConfig, TimeoutConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
