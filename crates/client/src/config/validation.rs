//! Semantic configuration checks.
//!
//! Serde handles syntax; this pass collects every semantic problem so a
//! broken file is reported in one go.

use crate::config::schema::SdkConfig;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{section}: host must not be empty")]
    EmptyHost { section: String },

    #[error("{section}: port must not be zero")]
    ZeroPort { section: String },

    #[error("tls.ca_certificate is required when TLS is enabled")]
    MissingCaCertificate,

    #[error("tls.client_certificate and tls.client_key must be set together")]
    PartialClientAuth,

    #[error("{0}")]
    UnsupportedHash(String),

    #[error("msp.id must not be empty")]
    EmptyMspId,

    #[error("timeouts.connect_secs must be greater than zero")]
    ZeroConnectTimeout,

    #[error("retry.base_delay_ms must not exceed retry.max_delay_ms")]
    InvertedRetryDelays,
}

/// Validate a parsed configuration, returning every problem found.
pub fn validate_config(config: &SdkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (i, peer) in config.peers.iter().enumerate() {
        check_endpoint(&format!("peers[{}]", i), &peer.host, peer.port, &mut errors);
    }
    for (i, orderer) in config.orderers.iter().enumerate() {
        check_endpoint(
            &format!("orderers[{}]", i),
            &orderer.host,
            orderer.port,
            &mut errors,
        );
    }

    if config.tls.enabled && config.tls.ca_certificate.is_none() {
        errors.push(ValidationError::MissingCaCertificate);
    }
    if config.tls.client_certificate.is_some() != config.tls.client_key.is_some() {
        errors.push(ValidationError::PartialClientAuth);
    }

    if let Err(e) = config.hash_algorithm() {
        errors.push(ValidationError::UnsupportedHash(e.to_string()));
    }
    if config.msp.id.trim().is_empty() {
        errors.push(ValidationError::EmptyMspId);
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ValidationError::InvertedRetryDelays);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(section: &str, host: &str, port: u16, errors: &mut Vec<ValidationError>) {
    if host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost {
            section: section.to_string(),
        });
    }
    if port == 0 {
        errors.push(ValidationError::ZeroPort {
            section: section.to_string(),
        });
    }
}
