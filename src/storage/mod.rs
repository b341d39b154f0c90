//! Persistence backends for the company list and its settings.
//!
//! Three interchangeable stores implement [`PersistenceBackend`]: the SQLite
//! database ([`crate::db::Database`]), a user-chosen JSON file
//! ([`file::FileBackend`]) and a key-value file ([`kv::KvStore`]).
//! [`BackendChain`] tries them in priority order and reports which one took
//! each write.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Company, SettingKey};

pub mod file;
pub mod kv;

#[cfg(test)]
pub(crate) mod memory;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} is not supported here")]
    Unsupported(&'static str),

    #[error("no storage file has been chosen")]
    NoFileSelected,

    #[error("file selection was cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Which store a backend writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum BackendKind {
    #[default]
    #[serde(rename = "sqlite", alias = "indexeddb")]
    Sqlite,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "kv", alias = "localStorage", alias = "localstorage")]
    KeyValue,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::File => "file",
            Self::KeyValue => "kv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" | "database" | "indexeddb" => Some(Self::Sqlite),
            "file" => Some(Self::File),
            "kv" | "localstorage" | "key-value" => Some(Self::KeyValue),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite database",
            Self::File => "File storage",
            Self::KeyValue => "Key-value store",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown backend \"{}\" (sqlite, file, kv)", s))
    }
}

/// Common contract of every store.
///
/// `load_all` returns an empty list when nothing has been saved yet or the
/// stored data cannot be decoded; errors mean the store itself is unusable.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn save_all(&self, companies: &[Company]) -> StorageResult<()>;

    async fn load_all(&self) -> StorageResult<Vec<Company>>;

    async fn save_setting(&self, key: SettingKey, value: i64) -> StorageResult<()>;

    async fn load_setting(&self, key: SettingKey) -> StorageResult<Option<i64>>;
}

/// Result of a write attempted against a [`BackendChain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Backend that accepted the write, if any did.
    pub saved_to: Option<BackendKind>,
    /// Backends tried before it, with the reason each failed.
    pub failures: Vec<(BackendKind, String)>,
}

impl SaveReport {
    pub fn is_saved(&self) -> bool {
        self.saved_to.is_some()
    }

    /// True when the write landed somewhere other than the first backend.
    pub fn fell_back(&self) -> bool {
        self.saved_to.is_some() && !self.failures.is_empty()
    }
}

/// Backends in priority order. Writes go to the first one that succeeds.
#[derive(Clone)]
pub struct BackendChain {
    backends: Vec<Arc<dyn PersistenceBackend>>,
}

impl BackendChain {
    pub fn new(primary: Arc<dyn PersistenceBackend>) -> Self {
        Self {
            backends: vec![primary],
        }
    }

    pub fn with_fallback(mut self, backend: Arc<dyn PersistenceBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn primary_kind(&self) -> BackendKind {
        self.backends[0].kind()
    }

    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    pub async fn save_all(&self, companies: &[Company]) -> SaveReport {
        let mut report = SaveReport::default();
        for backend in &self.backends {
            match backend.save_all(companies).await {
                Ok(()) => {
                    debug!(backend = %backend.kind(), count = companies.len(), "saved companies");
                    report.saved_to = Some(backend.kind());
                    break;
                }
                Err(e) => {
                    warn!(backend = %backend.kind(), error = %e, "save failed, trying next backend");
                    report.failures.push((backend.kind(), e.to_string()));
                }
            }
        }
        report
    }

    /// Load from the first backend that is usable.
    pub async fn load_all(&self) -> Vec<Company> {
        for backend in &self.backends {
            match backend.load_all().await {
                Ok(companies) => {
                    debug!(backend = %backend.kind(), count = companies.len(), "loaded companies");
                    return companies;
                }
                Err(e) => {
                    warn!(backend = %backend.kind(), error = %e, "load failed, trying next backend");
                }
            }
        }
        Vec::new()
    }

    pub async fn save_setting(&self, key: SettingKey, value: i64) -> SaveReport {
        let mut report = SaveReport::default();
        for backend in &self.backends {
            match backend.save_setting(key, value).await {
                Ok(()) => {
                    report.saved_to = Some(backend.kind());
                    break;
                }
                Err(e) => {
                    debug!(backend = %backend.kind(), key = key.as_str(), error = %e, "setting save failed");
                    report.failures.push((backend.kind(), e.to_string()));
                }
            }
        }
        report
    }

    pub async fn load_setting(&self, key: SettingKey) -> Option<i64> {
        for backend in &self.backends {
            match backend.load_setting(key).await {
                Ok(value) => return value,
                Err(e) => {
                    debug!(backend = %backend.kind(), key = key.as_str(), error = %e, "setting load failed");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryBackend;
    use super::*;

    #[tokio::test]
    async fn save_uses_primary_when_healthy() {
        let primary = Arc::new(MemoryBackend::new(BackendKind::Sqlite));
        let fallback = Arc::new(MemoryBackend::new(BackendKind::KeyValue));
        let chain = BackendChain::new(primary.clone()).with_fallback(fallback.clone());

        let report = chain.save_all(&[Company::new("Acme".to_string())]).await;
        assert_eq!(report.saved_to, Some(BackendKind::Sqlite));
        assert!(!report.fell_back());
        assert_eq!(primary.save_count(), 1);
        assert_eq!(fallback.save_count(), 0);
    }

    #[tokio::test]
    async fn save_falls_back_in_order() {
        let primary = Arc::new(MemoryBackend::failing(BackendKind::Sqlite));
        let fallback = Arc::new(MemoryBackend::new(BackendKind::KeyValue));
        let chain = BackendChain::new(primary).with_fallback(fallback.clone());

        let report = chain.save_all(&[Company::new("Acme".to_string())]).await;
        assert_eq!(report.saved_to, Some(BackendKind::KeyValue));
        assert!(report.fell_back());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, BackendKind::Sqlite);
        assert_eq!(fallback.companies().len(), 1);
    }

    #[tokio::test]
    async fn all_backends_failing_is_reported_not_raised() {
        let chain = BackendChain::new(Arc::new(MemoryBackend::failing(BackendKind::File)))
            .with_fallback(Arc::new(MemoryBackend::failing(BackendKind::KeyValue)));

        let report = chain.save_all(&[]).await;
        assert!(!report.is_saved());
        assert_eq!(report.failures.len(), 2);
        assert!(chain.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn settings_round_trip_through_chain() {
        let chain = BackendChain::new(Arc::new(MemoryBackend::new(BackendKind::KeyValue)));
        assert_eq!(chain.load_setting(SettingKey::DialerPosition).await, None);
        assert!(chain.save_setting(SettingKey::DialerPosition, 7).await.is_saved());
        assert_eq!(chain.load_setting(SettingKey::DialerPosition).await, Some(7));
    }

    #[test]
    fn backend_kind_parsing() {
        assert_eq!(BackendKind::parse("IndexedDB"), Some(BackendKind::Sqlite));
        assert_eq!(BackendKind::parse("localStorage"), Some(BackendKind::KeyValue));
        assert_eq!("file".parse::<BackendKind>(), Ok(BackendKind::File));
        assert!("cloud".parse::<BackendKind>().is_err());
    }
}
