//! Client context: configuration, crypto suite, state store and the active
//! signing identity.
//!
//! A [`Client`] is created once and shared through `Arc` by every channel
//! built from it. Users are persisted to the state store as JSON records
//! keyed by name so a later process can resume with the same identity.

use crate::channel::Channel;
use crate::config::SdkConfig;
use crate::error::{ChannelError, Result};
use crate::orderer::RemoteOrderer;
use crate::peer::RemotePeer;
use crate::transport::ConnectionOptions;
use fabsdk_core::{CryptoSuite, Keypair, SoftwareCryptoSuite};
use fabsdk_storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// An enrolled identity: certificate plus the key that signs for it.
#[derive(Debug, Clone)]
pub struct User {
    name: String,
    roles: Vec<String>,
    enrollment_certificate: Vec<u8>,
    keypair: Keypair,
}

/// On-disk form of a [`User`].
#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    name: String,
    #[serde(default)]
    roles: Vec<String>,
    enrollment_certificate: String,
    private_key: String,
}

impl User {
    pub fn new(name: impl Into<String>, enrollment_certificate: Vec<u8>, keypair: Keypair) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
            enrollment_certificate,
            keypair,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn set_roles(&mut self, roles: Vec<String>) {
        self.roles = roles;
    }

    pub fn enrollment_certificate(&self) -> &[u8] {
        &self.enrollment_certificate
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Serialize to the JSON record stored in the state store.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let record = UserRecord {
            name: self.name.clone(),
            roles: self.roles.clone(),
            enrollment_certificate: hex::encode(&self.enrollment_certificate),
            private_key: hex::encode(self.keypair.private_key()),
        };
        Ok(serde_json::to_vec_pretty(&record)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let record: UserRecord = serde_json::from_slice(bytes)?;
        let enrollment_certificate = hex::decode(&record.enrollment_certificate).map_err(|e| {
            ChannelError::IdentityUnavailable(format!(
                "user '{}' has a malformed certificate: {}",
                record.name, e
            ))
        })?;
        let keypair = Keypair::from_hex(&record.private_key)?;
        Ok(Self {
            name: record.name,
            roles: record.roles,
            enrollment_certificate,
            keypair,
        })
    }
}

pub struct Client {
    config: Arc<SdkConfig>,
    crypto_suite: Arc<dyn CryptoSuite>,
    state_store: RwLock<Option<Arc<dyn KeyValueStore>>>,
    user: RwLock<Option<Arc<User>>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("msp_id", &self.config.msp.id)
            .field("user", &self.user.read().unwrap_or_else(PoisonError::into_inner))
            .finish()
    }
}

impl Client {
    /// Create a client using the software crypto suite configured by
    /// `security.hash_algorithm` and `security.level`.
    pub fn new(config: SdkConfig) -> Result<Self> {
        let algorithm = config
            .hash_algorithm()
            .map_err(|e| ChannelError::InvalidArgument(e.to_string()))?;
        Ok(Self::with_crypto_suite(
            config,
            Arc::new(SoftwareCryptoSuite::new(algorithm)),
        ))
    }

    pub fn with_crypto_suite(config: SdkConfig, crypto_suite: Arc<dyn CryptoSuite>) -> Self {
        Self {
            config: Arc::new(config),
            crypto_suite,
            state_store: RwLock::new(None),
            user: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn crypto_suite(&self) -> &dyn CryptoSuite {
        self.crypto_suite.as_ref()
    }

    pub fn set_state_store(&self, store: Arc<dyn KeyValueStore>) {
        *self.state_store.write().unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    pub fn state_store(&self) -> Option<Arc<dyn KeyValueStore>> {
        self.state_store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `user` the active identity, persisting it unless asked not to.
    pub fn set_user_context(&self, user: User, skip_persistence: bool) -> Result<Arc<User>> {
        if !skip_persistence {
            let store = self.state_store().ok_or_else(|| {
                ChannelError::InvalidArgument("cannot persist user without a state store".into())
            })?;
            store.set_value(user.name(), user.to_json()?)?;
            tracing::debug!(user = user.name(), "Persisted user context");
        }

        let user = Arc::new(user);
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&user));
        Ok(user)
    }

    /// The identity operations sign with.
    ///
    /// An empty `name` returns whichever user is active. A non-empty name
    /// returns the active user if it matches, otherwise loads the user from
    /// the state store and makes it active.
    pub fn user_context(&self, name: &str) -> Result<Arc<User>> {
        if let Some(user) = self
            .user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            if name.is_empty() || user.name() == name {
                return Ok(Arc::clone(user));
            }
        }

        if name.is_empty() {
            return Err(ChannelError::IdentityUnavailable("no user context has been set".into()));
        }

        let store = self.state_store().ok_or_else(|| {
            ChannelError::IdentityUnavailable(format!(
                "user '{}' not loaded and no state store",
                name
            ))
        })?;
        let bytes = store.get_value(name)?.ok_or_else(|| {
            ChannelError::IdentityUnavailable(format!("user '{}' not found", name))
        })?;
        let user = User::from_json(&bytes)?;
        tracing::debug!(user = name, "Loaded user context from state store");
        self.set_user_context(user, true)
    }

    /// Create an empty channel bound to this client.
    pub fn new_channel(self: &Arc<Self>, name: &str) -> Result<Channel> {
        Channel::new(name, Arc::clone(self))
    }

    /// Create a channel with every peer and orderer from the configuration.
    pub fn new_configured_channel(self: &Arc<Self>, name: &str) -> Result<Channel> {
        let mut channel = self.new_channel(name)?;
        let options = ConnectionOptions::from_config(&self.config).map_err(ChannelError::TlsSetup)?;

        for peer in &self.config.peers {
            channel.add_peer(Arc::new(RemotePeer::from_config(
                &self.config,
                peer,
                options.clone(),
            )));
        }
        for orderer in &self.config.orderers {
            channel.add_orderer(Arc::new(RemoteOrderer::from_config(
                &self.config,
                orderer,
                options.clone(),
            )));
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EndpointError;
    use fabsdk_storage::SledStore;

    fn user(name: &str) -> User {
        User::new(name, b"cert".to_vec(), Keypair::generate())
    }

    #[test]
    fn test_no_user_context() {
        let client = Client::new(SdkConfig::default()).unwrap();
        assert!(matches!(
            client.user_context(""),
            Err(ChannelError::IdentityUnavailable(_))
        ));
    }

    #[test]
    fn test_set_without_persistence() {
        let client = Client::new(SdkConfig::default()).unwrap();
        client.set_user_context(user("alice"), true).unwrap();
        assert_eq!(client.user_context("").unwrap().name(), "alice");
        assert_eq!(client.user_context("alice").unwrap().name(), "alice");
        assert!(client.user_context("bob").is_err());
    }

    #[test]
    fn test_persistence_requires_store() {
        let client = Client::new(SdkConfig::default()).unwrap();
        let result = client.set_user_context(user("alice"), false);
        assert!(matches!(result, Err(ChannelError::InvalidArgument(_))));
    }

    #[test]
    fn test_user_round_trips_through_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(SledStore::open_temporary().unwrap());
        let mut alice = user("alice");
        alice.set_roles(vec!["client".into()]);
        let public_key = alice.keypair().public_key.clone();

        let first = Client::new(SdkConfig::default()).unwrap();
        first.set_state_store(Arc::clone(&store));
        first.set_user_context(alice, false).unwrap();

        let second = Client::new(SdkConfig::default()).unwrap();
        second.set_state_store(store);
        let loaded = second.user_context("alice").unwrap();
        assert_eq!(loaded.roles(), ["client".to_string()]);
        assert_eq!(loaded.enrollment_certificate(), b"cert");
        assert_eq!(loaded.keypair().public_key, public_key);
        assert_eq!(second.user_context("").unwrap().name(), "alice");
    }

    #[test]
    fn test_corrupt_record() {
        let store = Arc::new(SledStore::open_temporary().unwrap());
        store.set_value("mallory", b"{not json".to_vec()).unwrap();

        let client = Client::new(SdkConfig::default()).unwrap();
        client.set_state_store(store);
        assert!(matches!(
            client.user_context("mallory"),
            Err(ChannelError::UserRecord(_))
        ));
    }

    #[test]
    fn test_configured_channel_with_unreadable_ca() {
        let mut config = SdkConfig::default();
        config.tls.enabled = true;
        config.tls.ca_certificate = Some("/nonexistent/ca.pem".into());
        let client = Arc::new(Client::new(config).unwrap());

        let err = client.new_configured_channel("mychannel").unwrap_err();
        assert!(matches!(err, ChannelError::TlsSetup(EndpointError::Tls(_))));
        assert!(err.to_string().starts_with("invalid TLS configuration"));
    }

    #[test]
    fn test_unsupported_hash_rejected() {
        let mut config = SdkConfig::default();
        config.security.level = 512;
        assert!(matches!(
            Client::new(config),
            Err(ChannelError::InvalidArgument(_))
        ));
    }
}
