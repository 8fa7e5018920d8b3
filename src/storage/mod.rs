//! Best-effort persistence of the ledger collections.
//!
//! Every collection is serialized to JSON and stored under a key shaped
//! `{entity-kind}_{username-or-"null"}`. Stores are async and fallible; the
//! [`PersistenceGateway`] adds the simulated latency and the anonymous-key
//! short-cut, and [`SyncedCollection`] layers optimistic local updates on top.

pub mod gateway;
pub mod json_backend;
pub mod memory;
pub mod synced;

use std::fmt;

use async_trait::async_trait;

use crate::errors::Result;

pub use gateway::PersistenceGateway;
pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
pub use synced::{SaveHandle, SyncStatus, SyncedCollection, LOAD_ERROR_BANNER, SAVE_ERROR_BANNER};

/// Raw string key/value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Transactions,
    ServiceRecords,
    Users,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Transactions => "transactions",
            EntityKind::ServiceRecords => "service_records",
            EntityKind::Users => "users",
        }
    }

    /// Whether the collection belongs to a single user.
    pub fn is_user_scoped(&self) -> bool {
        !matches!(self, EntityKind::Users)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    kind: EntityKind,
    user: Option<String>,
}

impl StorageKey {
    pub fn new(kind: EntityKind, user: Option<&str>) -> Self {
        Self {
            kind,
            user: user.map(str::to_string),
        }
    }

    /// Key for a collection that is shared by every user.
    pub fn global(kind: EntityKind) -> Self {
        Self { kind, user: None }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// A user-scoped key with nobody signed in never touches the store.
    pub fn is_anonymous(&self) -> bool {
        self.kind.is_user_scoped() && self.user.is_none()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.kind.is_user_scoped() {
            return f.write_str(self.kind.as_str());
        }
        write!(
            f,
            "{}_{}",
            self.kind.as_str(),
            self.user.as_deref().unwrap_or("null")
        )
    }
}
