use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::errors::LedgerError;

use super::{PersistenceGateway, StorageKey};

pub const LOAD_ERROR_BANNER: &str = "Could not load data. Please try again later.";
pub const SAVE_ERROR_BANNER: &str = "Could not save data. Changes might not be persisted.";

/// Outcome of the latest load or save, as shown in the warning banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub error: Option<String>,
}

/// Background write started by [`SyncedCollection::update`].
#[derive(Debug)]
pub struct SaveHandle(JoinHandle<()>);

impl SaveHandle {
    /// Waits until the write finished and the status has been updated.
    pub async fn wait(self) {
        if let Err(err) = self.0.await {
            tracing::warn!(error = %err, "save task did not complete");
        }
    }
}

/// A collection kept in memory and mirrored to the store.
///
/// Changes apply locally at once and are persisted afterwards. A failed write
/// does not roll anything back; it only sets the banner until a later write
/// succeeds. Writes of one collection are chained so the store always ends up
/// with the most recent snapshot.
pub struct SyncedCollection<T> {
    key: StorageKey,
    items: Vec<T>,
    gateway: PersistenceGateway,
    status: Arc<Mutex<SyncStatus>>,
    last_save: Option<oneshot::Receiver<()>>,
}

impl<T> SyncedCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Loads the collection stored under `key`, starting empty if that fails.
    pub async fn open(gateway: PersistenceGateway, key: StorageKey) -> Self {
        let (items, error) = match gateway.load(&key, Vec::new()).await {
            Ok(items) => (items, None),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "loading collection failed");
                (Vec::new(), Some(LOAD_ERROR_BANNER.to_string()))
            }
        };
        Self {
            key,
            items,
            gateway,
            status: Arc::new(Mutex::new(SyncStatus { error })),
            last_save: None,
        }
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .lock()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    pub fn banner(&self) -> Option<String> {
        self.status().error
    }

    /// Waits until every save scheduled so far has reached the store.
    pub async fn flush(&mut self) {
        if let Some(pending) = self.last_save.take() {
            // A dropped sender means the task is gone; there is nothing left to wait for.
            let _ = pending.await;
        }
    }

    /// Applies `change` to a working copy, commits it when it succeeds and
    /// schedules a save of the new contents.
    pub fn update<R, E>(
        &mut self,
        change: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> Result<(R, SaveHandle), E> {
        let mut working = self.items.clone();
        let outcome = change(&mut working)?;
        self.items = working;
        Ok((outcome, self.persist()))
    }

    fn persist(&mut self) -> SaveHandle {
        let previous = self.last_save.take();
        let (done_tx, done_rx) = oneshot::channel();
        self.last_save = Some(done_rx);

        let snapshot = self.items.clone();
        let gateway = self.gateway.clone();
        let key = self.key.clone();
        let status = Arc::clone(&self.status);

        SaveHandle(tokio::spawn(async move {
            if let Some(previous) = previous {
                // A dropped sender means the earlier task is gone; nothing to wait for.
                let _ = previous.await;
            }
            let result = match gateway.save(&key, &snapshot).await {
                Ok(result) => result,
                Err(join_err) => Err(LedgerError::Storage(join_err.to_string())),
            };
            let error = match result {
                Ok(()) => None,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "saving collection failed");
                    Some(SAVE_ERROR_BANNER.to_string())
                }
            };
            if let Ok(mut guard) = status.lock() {
                guard.error = error;
            }
            let _ = done_tx.send(());
        }))
    }
}
