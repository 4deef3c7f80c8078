//! Persistent key-value store for client state.
//!
//! The client keeps enrolled users (name, certificate, signing key) between
//! runs. This crate provides the store contract and a sled-backed
//! implementation of it.
//!
//! # Example
//!
//! ```rust,no_run
//! use fabsdk_storage::{KeyValueStore, SledStore};
//!
//! let store = SledStore::open("/tmp/enroll_user").unwrap();
//! store.set_value("testUser", b"record".to_vec()).unwrap();
//! assert_eq!(store.get_value("testUser").unwrap(), Some(b"record".to_vec()));
//! ```

pub mod db;

// Re-export commonly used types
pub use db::{KeyValueStore, Result, SledStore, StorageError};
