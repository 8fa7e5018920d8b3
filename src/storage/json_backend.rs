use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;

use crate::errors::{LedgerError, Result};
use crate::utils::paths::{self, tmp_path};

use super::KeyValueStore;

/// Stores each key as a pretty-printed JSON file under `root`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        paths::ensure_dir(&root)?;
        Ok(Self { root })
    }

    /// Store rooted at the default application data directory.
    pub fn new_default() -> Result<Self> {
        Self::new(paths::data_dir_in(&paths::app_data_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(key)))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(LedgerError::Storage(format!(
                "reading {}: {}",
                path.display(),
                err
            ))),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        let pretty = match serde_json::from_str::<serde_json::Value>(&value) {
            Ok(parsed) => serde_json::to_string_pretty(&parsed)?,
            Err(_) => value,
        };
        fs::create_dir_all(&self.root).await?;
        let tmp = tmp_path(&path);
        fs::write(&tmp, pretty.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;
        tracing::debug!(key, path = %path.display(), "stored collection");
        Ok(())
    }
}

/// Escapes anything outside `[A-Za-z0-9_-]` so distinct keys never share a file.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'-' => stem.push(byte as char),
            other => stem.push_str(&format!("~{:02x}", other)),
        }
    }
    if stem.is_empty() {
        "empty".into()
    } else {
        stem
    }
}
