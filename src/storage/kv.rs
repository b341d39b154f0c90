//! Simple key-value store persisted as a single JSON object.
//!
//! The last-resort backend: the whole company list is serialized under one
//! key, settings under their own names as decimal strings. Writes rewrite the
//! file in place with no transactionality.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::warn;

use super::{BackendKind, PersistenceBackend, StorageError, StorageResult};
use crate::models::{Company, SettingKey};

const COMPANIES_KEY: &str = "companies";

pub struct KvStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl KvStore {
    /// Open the store at `path`, starting empty if the file is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "key-value file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn entries(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| StorageError::Poisoned)
    }

    pub fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Write `key`. The in-memory map only changes once the file write succeeds.
    pub fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let mut entries = self.entries()?;
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        self.flush(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(path) = &self.path {
            std::fs::write(path, serde_json::to_string(entries)?)?;
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceBackend for KvStore {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn save_all(&self, companies: &[Company]) -> StorageResult<()> {
        let encoded = serde_json::to_string(companies)?;
        self.set(COMPANIES_KEY, encoded)
    }

    async fn load_all(&self) -> StorageResult<Vec<Company>> {
        let Some(encoded) = self.get(COMPANIES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&encoded) {
            Ok(companies) => Ok(companies),
            Err(e) => {
                warn!(error = %e, "stored company list is corrupt, ignoring it");
                Ok(Vec::new())
            }
        }
    }

    async fn save_setting(&self, key: SettingKey, value: i64) -> StorageResult<()> {
        self.set(key.as_str(), value.to_string())
    }

    async fn load_setting(&self, key: SettingKey) -> StorageResult<Option<i64>> {
        Ok(self
            .get(key.as_str())?
            .and_then(|v| v.trim().parse::<i64>().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn companies_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let store = KvStore::open(&path).unwrap();
        let mut company = Company::new("Acme".to_string());
        company.notes = "call after lunch".to_string();
        store.save_all(&[company.clone()]).await.unwrap();
        store.save_setting(SettingKey::CallClicks, 3).await.unwrap();

        let reopened = KvStore::open(&path).unwrap();
        assert_eq!(reopened.load_all().await.unwrap(), vec![company]);
        assert_eq!(reopened.load_setting(SettingKey::CallClicks).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn missing_and_corrupt_data_load_empty() {
        let store = KvStore::in_memory();
        assert!(store.load_all().await.unwrap().is_empty());

        store.set(COMPANIES_KEY, "{not json".to_string()).unwrap();
        assert!(store.load_all().await.unwrap().is_empty());

        store.set("dialerPosition", "abc".to_string()).unwrap();
        assert_eq!(store.load_setting(SettingKey::DialerPosition).await.unwrap(), None);
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = KvStore::open(&path).unwrap();
        assert_eq!(store.get(COMPANIES_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let store = KvStore::open(&path).unwrap();
        store.save_setting(SettingKey::CallClicks, 2).await.unwrap();

        // a directory in place of the file makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.save_all(&[Company::new("Ghost".to_string())]).await.is_err());
        assert!(store.save_setting(SettingKey::CallClicks, 9).await.is_err());
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.load_setting(SettingKey::CallClicks).await.unwrap(), Some(2));
    }
}
