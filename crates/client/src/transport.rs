//! Connection establishment for peer and orderer endpoints.
//!
//! Every connection is a TCP stream, optionally wrapped in TLS. The whole
//! connecting phase (TCP connect plus TLS handshake) is bounded by the
//! configured connect timeout.

use crate::config::SdkConfig;
use crate::error::EndpointError;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

/// A bidirectional byte stream to an endpoint.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

pub type BoxedStream = Box<dyn Stream>;

#[derive(Clone)]
struct TlsSettings {
    connector: TlsConnector,
    server_host_override: Option<String>,
}

/// How to reach endpoints: connect timeout and optional TLS.
#[derive(Clone)]
pub struct ConnectionOptions {
    connect_timeout: Duration,
    tls: Option<TlsSettings>,
}

impl std::fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("connect_timeout", &self.connect_timeout)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::plaintext(Duration::from_secs(3))
    }
}

impl ConnectionOptions {
    /// Plain TCP with the given connect timeout.
    pub fn plaintext(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            tls: None,
        }
    }

    /// Build options from configuration, loading TLS material if enabled.
    pub fn from_config(config: &SdkConfig) -> Result<Self, EndpointError> {
        let connect_timeout = config.timeouts.connect();
        if !config.tls.enabled {
            return Ok(Self::plaintext(connect_timeout));
        }

        let ca_path = config
            .tls
            .ca_certificate
            .as_deref()
            .ok_or_else(|| EndpointError::Tls("TLS enabled without a CA certificate".into()))?;
        let mut roots = RootCertStore::empty();
        for cert in load_certs(ca_path)? {
            roots
                .add(cert)
                .map_err(|e| EndpointError::Tls(format!("invalid CA certificate: {}", e)))?;
        }

        let client_auth = match (&config.tls.client_certificate, &config.tls.client_key) {
            (Some(cert), Some(key)) => Some((load_certs(cert)?, load_key(key)?)),
            _ => None,
        };

        let tls_config = build_client_config(roots, client_auth)?;
        Ok(Self {
            connect_timeout,
            tls: Some(TlsSettings {
                connector: TlsConnector::from(Arc::new(tls_config)),
                server_host_override: config.tls.server_host_override.clone(),
            }),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Open a stream to `address` ("host:port").
    pub async fn connect(&self, address: &str) -> Result<BoxedStream, EndpointError> {
        timeout(self.connect_timeout, self.establish(address))
            .await
            .map_err(|_| EndpointError::Timeout(self.connect_timeout))?
    }

    async fn establish(&self, address: &str) -> Result<BoxedStream, EndpointError> {
        let tcp = TcpStream::connect(address)
            .await
            .map_err(|e| EndpointError::Connection {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        let _ = tcp.set_nodelay(true);

        let Some(tls) = &self.tls else {
            return Ok(Box::new(tcp));
        };

        let host = tls
            .server_host_override
            .clone()
            .unwrap_or_else(|| host_of(address).to_string());
        let server_name = ServerName::try_from(host)
            .map_err(|e| EndpointError::Tls(format!("invalid server name: {}", e)))?;
        let stream = tls
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| EndpointError::Tls(e.to_string()))?;
        Ok(Box::new(stream))
    }
}

fn build_client_config(
    roots: RootCertStore,
    client_auth: Option<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)>,
) -> Result<ClientConfig, EndpointError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| EndpointError::Tls(e.to_string()))?
        .with_root_certificates(roots);

    match client_auth {
        Some((certs, key)) => builder
            .with_client_auth_cert(certs, key)
            .map_err(|e| EndpointError::Tls(format!("invalid client certificate: {}", e))),
        None => Ok(builder.with_no_client_auth()),
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, EndpointError> {
    let file = File::open(path)
        .map_err(|e| EndpointError::Tls(format!("cannot open {}: {}", path.display(), e)))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EndpointError::Tls(format!("cannot parse {}: {}", path.display(), e)))?;
    if certs.is_empty() {
        return Err(EndpointError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, EndpointError> {
    let file = File::open(path)
        .map_err(|e| EndpointError::Tls(format!("cannot open {}: {}", path.display(), e)))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| EndpointError::Tls(format!("cannot parse {}: {}", path.display(), e)))?
        .ok_or_else(|| EndpointError::Tls(format!("no private key found in {}", path.display())))
}

/// Host part of "host:port", without IPv6 brackets.
fn host_of(address: &str) -> &str {
    let host = address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(address);
    host.trim_start_matches('[').trim_end_matches(']')
}
