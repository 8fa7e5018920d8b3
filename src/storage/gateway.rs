use std::{sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::errors::{LedgerError, Result};

use super::{KeyValueStore, StorageKey};

/// Async, fallible access to the stored collections.
///
/// `load` and `save` sleep for the configured latency to mimic a remote
/// backend. Keys without a signed-in user resolve to the initial value and are
/// never written.
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    load_latency: Duration,
    save_latency: Duration,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            load_latency: Duration::ZERO,
            save_latency: Duration::ZERO,
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self::new(store).with_latency(config.load_latency(), config.save_latency())
    }

    pub fn with_latency(mut self, load: Duration, save: Duration) -> Self {
        self.load_latency = load;
        self.save_latency = save;
        self
    }

    pub async fn load<T>(&self, key: &StorageKey, initial: T) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if key.is_anonymous() {
            return Ok(initial);
        }
        let name = key.to_string();
        tracing::debug!(key = %name, "loading collection");
        pause(self.load_latency).await;
        match self.store.get(&name).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(initial),
        }
    }

    /// Serializes `value` now and writes it in the background.
    ///
    /// Must be called from within a Tokio runtime. The returned handle only
    /// matters to callers that want to observe the outcome.
    pub fn save<T>(&self, key: &StorageKey, value: &T) -> JoinHandle<Result<()>>
    where
        T: Serialize + ?Sized,
    {
        if key.is_anonymous() {
            return tokio::spawn(async { Ok(()) });
        }
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                let err = LedgerError::from(err);
                return tokio::spawn(async move { Err(err) });
            }
        };
        let name = key.to_string();
        let store = Arc::clone(&self.store);
        let latency = self.save_latency;
        tokio::spawn(async move {
            tracing::debug!(key = %name, bytes = payload.len(), "saving collection");
            pause(latency).await;
            store.set(&name, payload).await
        })
    }
}

async fn pause(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}
