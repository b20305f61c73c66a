//! Client key-value storage port.
//!
//! Two instances are wired in practice: a durable store surviving reloads
//! (viewed-organization record, provisioning guard, per-user flags) and a
//! volatile tab-scoped store (session hint). Both speak this one trait;
//! the typed records over it live in `mostrador-session`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("client storage unavailable: {0}")]
    Unavailable(String),

    /// A stored record failed to encode or decode. Readers treat this as
    /// "record absent" and drop the offending key.
    #[error("stored record corrupt: {0}")]
    Corrupt(String),
}

/// String key-value persistence. Values are serialized records (JSON).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
