//! Application controller: builds the backends, owns the store and the file
//! storage actions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::models::SettingKey;
use crate::storage::file::{read_snapshot, write_snapshot, FileBackend, FilePicker, NativePicker, SaveTarget};
use crate::storage::kv::KvStore;
use crate::storage::{BackendChain, BackendKind, PersistenceBackend, SaveReport, StorageError};
use crate::store::{parse_import, ImportSummary, RecordStore, SharedStore};

/// Key-value entry remembering the file chosen for file storage.
pub const FILE_PATH_KEY: &str = "filePath";

/// Storage details for the `info` command.
#[derive(Debug, Clone)]
pub struct StorageInfo {
    pub backend: BackendKind,
    pub chain: Vec<BackendKind>,
    pub companies: usize,
    pub file_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub db_size: Option<u64>,
    pub kv_path: Option<PathBuf>,
    pub kv_size: Option<u64>,
    pub last_saved: Option<DateTime<Utc>>,
}

/// What [`App::init`] repaired on startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitSummary {
    pub backfilled: usize,
    pub reparsed: usize,
}

pub struct App {
    config: Config,
    store: SharedStore,
    kv: Arc<KvStore>,
    file: Arc<FileBackend>,
    database: Option<Arc<Database>>,
    initialized: bool,
    autosave: Option<JoinHandle<()>>,
}

impl App {
    pub async fn open(config: Config) -> Result<Self> {
        Self::open_with_picker(config, Box::new(NativePicker)).await
    }

    pub async fn open_with_picker(config: Config, picker: Box<dyn FilePicker>) -> Result<Self> {
        let kv = Arc::new(KvStore::open(config.kv_path()?).context("Failed to open key-value store")?);

        let remembered = kv.get(FILE_PATH_KEY)?.map(PathBuf::from);
        let file = Arc::new(FileBackend::new(picker, config.download_dir()?).with_handle(remembered));

        let database = match config.backend {
            BackendKind::Sqlite => match Database::open_at(config.db_path()?) {
                Ok(db) => Some(Arc::new(db)),
                Err(e) => {
                    warn!(error = %e, "database unavailable, using key-value store");
                    None
                }
            },
            _ => None,
        };

        let primary: Arc<dyn PersistenceBackend> = match (config.backend, &database) {
            (BackendKind::Sqlite, Some(db)) => db.clone(),
            (BackendKind::File, _) => file.clone(),
            _ => kv.clone(),
        };
        let mut chain = BackendChain::new(primary.clone());
        if primary.kind() != BackendKind::KeyValue {
            chain = chain.with_fallback(kv.clone());
        }
        debug!(chain = ?chain.kinds(), "storage backends ready");

        let store = RecordStore::load(chain).await.into_shared();

        Ok(Self {
            config,
            store,
            kv,
            file,
            database,
            initialized: false,
            autosave: None,
        })
    }

    /// One-time startup repair of derived locations. Later calls do nothing.
    pub async fn init(&mut self) -> InitSummary {
        if self.initialized {
            return InitSummary::default();
        }
        self.initialized = true;

        let mut store = self.store.lock().await;
        let mut summary = InitSummary {
            backfilled: store.backfill_missing_location().await,
            reparsed: 0,
        };
        if store.needs_reparse() {
            summary.reparsed = store.reparse_all_addresses().await;
        }
        drop(store);

        if self.config.backend == BackendKind::File && self.file.handle().is_some() {
            self.start_autosave();
        }
        if summary != InitSummary::default() {
            info!(backfilled = summary.backfilled, reparsed = summary.reparsed, "repaired company locations");
        }
        summary
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    // ==================== IMPORT ====================

    /// Append the leads in a JSON export file.
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let items = parse_import(&text).with_context(|| format!("Invalid import file {}", path.display()))?;
        Ok(self.store.lock().await.import_records(items).await)
    }

    // ==================== FILE STORAGE ====================

    /// Save everything to a user-chosen file and keep writing there.
    pub async fn save_to_file(&mut self) -> Result<SaveTarget> {
        let snapshot = self.store.lock().await.export_snapshot().await;
        let file = self.file.clone();
        let file_name = self.config.data_file_name.clone();
        let target = tokio::task::block_in_place(move || file.save_data(&snapshot, &file_name))?;

        if let SaveTarget::Chosen(path) = &target {
            self.remember_file(path)?;
            self.start_autosave();
        }
        Ok(target)
    }

    /// Replace everything with the contents of a user-chosen file.
    ///
    /// `Ok(None)` means the dialog was cancelled.
    pub async fn load_from_file(&mut self) -> Result<Option<(PathBuf, SaveReport)>> {
        let file = self.file.clone();
        let Some((path, snapshot)) = tokio::task::block_in_place(move || file.load_data())? else {
            return Ok(None);
        };

        let report = self.store.lock().await.import_snapshot(snapshot).await?;
        self.remember_file(&path)?;
        self.start_autosave();
        Ok(Some((path, report)))
    }

    fn remember_file(&self, path: &Path) -> Result<()> {
        self.kv.set(FILE_PATH_KEY, path.display().to_string())?;
        Ok(())
    }

    /// Periodically rewrite the chosen file with the full snapshot.
    pub fn start_autosave(&mut self) {
        if self.autosave.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let store = self.store.clone();
        let file = self.file.clone();
        let period = self.config.autosave_interval();
        self.autosave = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let snapshot = store.lock().await.export_snapshot().await;
                match file.autosave(&snapshot) {
                    Ok(true) => debug!(count = snapshot.companies.len(), "autosaved to file"),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "autosave failed"),
                }
            }
        }));
    }

    pub fn stop_autosave(&mut self) {
        if let Some(handle) = self.autosave.take() {
            handle.abort();
        }
    }

    pub fn autosave_running(&self) -> bool {
        self.autosave.as_ref().is_some_and(|h| !h.is_finished())
    }

    // ==================== BACKUPS ====================

    pub fn default_backup_name() -> String {
        format!("cold-calling-backup-{}.json", Local::now().format("%Y-%m-%d"))
    }

    /// Write a backup to `path`, or to the downloads directory under the default name.
    pub async fn export_backup(&self, path: Option<&Path>) -> Result<PathBuf> {
        let snapshot = self.store.lock().await.export_snapshot().await;
        let written = match path {
            Some(path) => {
                write_snapshot(path, &snapshot)?;
                path.to_path_buf()
            }
            None => self.file.download_as_file(&snapshot, &Self::default_backup_name())?,
        };
        info!(path = %written.display(), count = snapshot.companies.len(), "backup exported");
        Ok(written)
    }

    /// Replace all companies with a backup file and merge its settings.
    pub async fn import_backup(&self, path: &Path) -> Result<SaveReport> {
        let snapshot = read_snapshot(path).map_err(|e| match e {
            StorageError::Json(e) => anyhow::Error::new(e).context("Invalid backup file format"),
            other => anyhow::Error::new(other).context(format!("Failed to read {}", path.display())),
        })?;
        let report = self.store.lock().await.import_snapshot(snapshot).await?;
        Ok(report)
    }

    // ==================== CALLS ====================

    /// Count one opened call link. Returns the new total.
    pub async fn record_call(&self) -> i64 {
        let (clicks, _) = self.store.lock().await.increment_setting(SettingKey::CallClicks).await;
        clicks
    }

    pub async fn call_clicks(&self) -> i64 {
        self.store
            .lock()
            .await
            .setting(SettingKey::CallClicks)
            .await
            .unwrap_or(0)
    }

    pub async fn reset_call_clicks(&self) -> SaveReport {
        self.store.lock().await.set_setting(SettingKey::CallClicks, 0).await
    }

    // ==================== INFO ====================

    pub async fn storage_info(&self) -> StorageInfo {
        let store = self.store.lock().await;
        let kv_path = self.kv.path().map(Path::to_path_buf);
        let kv_size = kv_path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len());

        StorageInfo {
            backend: store.backends().primary_kind(),
            chain: store.backends().kinds(),
            companies: store.len(),
            file_path: self.file.handle(),
            db_path: self.database.as_ref().and_then(|db| db.path().map(Path::to_path_buf)),
            db_size: self.database.as_ref().and_then(|db| db.file_size()),
            kv_path,
            kv_size,
            last_saved: self
                .database
                .as_ref()
                .and_then(|db| db.last_saved_at().ok().flatten()),
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_autosave();
    }
}

/// Human-readable byte count ("1.5 KB").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
