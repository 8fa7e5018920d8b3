//! Local user directory and the signed-in session.
//!
//! Credentials are kept as salted SHA-256 digests in the shared `users`
//! collection. This only keeps one person's data apart from another's on the
//! same device; it is not an authentication system.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::{LedgerError, Result, ValidationError};
use crate::storage::{EntityKind, PersistenceGateway, SaveHandle, StorageKey, SyncedCollection};

pub const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "password";

pub const INVALID_LOGIN: &str = "Invalid username or password.";
pub const USERNAME_TAKEN: &str = "Username already exists.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub salt: String,
    pub password_hash: String,
}

impl UserRecord {
    pub fn new(username: &str, password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let password_hash = digest(&salt, password);
        Self {
            username: username.to_string(),
            salt,
            password_hash,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.password_hash
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The signed-in user, if any. Storage keys are derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_user: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            current_user: Some(username.into()),
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn storage_key(&self, kind: EntityKind) -> StorageKey {
        StorageKey::new(kind, self.current_user())
    }
}

/// Registered users, persisted under the `users` key.
pub struct CredentialStore {
    users: SyncedCollection<UserRecord>,
}

impl CredentialStore {
    /// Loads the directory, seeding the default account when it is empty.
    pub async fn open(gateway: PersistenceGateway) -> Self {
        let users = SyncedCollection::open(gateway, StorageKey::global(EntityKind::Users)).await;
        let mut store = Self { users };
        if store.users.items().is_empty() && store.users.banner().is_none() {
            let seeded = store.users.update(|users| {
                users.push(UserRecord::new(DEFAULT_USERNAME, DEFAULT_PASSWORD));
                Ok::<_, LedgerError>(())
            });
            if let Ok(((), handle)) = seeded {
                handle.wait().await;
            }
        }
        store
    }

    pub fn usernames(&self) -> Vec<&str> {
        self.users
            .items()
            .iter()
            .map(|user| user.username.as_str())
            .collect()
    }

    pub fn banner(&self) -> Option<String> {
        self.users.banner()
    }

    /// Signs in when the username matches exactly and the password verifies.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }
        let found = self
            .users
            .items()
            .iter()
            .any(|user| user.username == username && user.verify(password));
        if found {
            tracing::info!(user = username, "signed in");
            Ok(Session::signed_in(username))
        } else {
            tracing::info!(user = username, "sign-in rejected");
            Err(LedgerError::Credential(INVALID_LOGIN.into()))
        }
    }

    /// Adds a user and signs them in. Names are unique ignoring case.
    pub fn register(&mut self, username: &str, password: &str) -> Result<(Session, SaveHandle)> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }
        let lowered = username.to_lowercase();
        let ((), handle) = self.users.update(|users| {
            if users
                .iter()
                .any(|user| user.username.to_lowercase() == lowered)
            {
                return Err(LedgerError::Credential(USERNAME_TAKEN.into()));
            }
            users.push(UserRecord::new(username, password));
            Ok(())
        })?;
        tracing::info!(user = username, "registered");
        Ok((Session::signed_in(username), handle))
    }
}
