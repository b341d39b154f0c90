//! In-memory backend for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BackendKind, PersistenceBackend, StorageError, StorageResult};
use crate::models::{Company, SettingKey};

pub struct MemoryBackend {
    kind: BackendKind,
    fail: bool,
    saves: AtomicUsize,
    companies: Mutex<Vec<Company>>,
    settings: Mutex<HashMap<SettingKey, i64>>,
}

impl MemoryBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            fail: false,
            saves: AtomicUsize::new(0),
            companies: Mutex::new(Vec::new()),
            settings: Mutex::new(HashMap::new()),
        }
    }

    /// A backend whose every call fails.
    pub fn failing(kind: BackendKind) -> Self {
        Self {
            fail: true,
            ..Self::new(kind)
        }
    }

    pub fn with_companies(self, companies: Vec<Company>) -> Self {
        *self.companies.lock().unwrap() = companies;
        self
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn companies(&self) -> Vec<Company> {
        self.companies.lock().unwrap().clone()
    }

    fn check(&self) -> StorageResult<()> {
        if self.fail {
            Err(StorageError::Unsupported("memory backend"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn save_all(&self, companies: &[Company]) -> StorageResult<()> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.companies.lock().unwrap() = companies.to_vec();
        Ok(())
    }

    async fn load_all(&self) -> StorageResult<Vec<Company>> {
        self.check()?;
        Ok(self.companies())
    }

    async fn save_setting(&self, key: SettingKey, value: i64) -> StorageResult<()> {
        self.check()?;
        self.settings.lock().unwrap().insert(key, value);
        Ok(())
    }

    async fn load_setting(&self, key: SettingKey) -> StorageResult<Option<i64>> {
        self.check()?;
        Ok(self.settings.lock().unwrap().get(&key).copied())
    }
}
