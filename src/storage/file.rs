//! User-chosen JSON file storage.
//!
//! Saving and loading are explicit user actions that go through a file dialog.
//! Once a file has been chosen, contract writes (and the periodic autosave)
//! rewrite the whole backup snapshot there. Until then every contract call
//! fails with [`StorageError::NoFileSelected`] so the chain falls back.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rfd::FileDialog;
use tracing::{info, warn};

use super::{BackendKind, PersistenceBackend, StorageError, StorageResult};
use crate::models::{Company, SettingKey, Settings, Snapshot};

/// Default name suggested when saving to a new file.
pub const DEFAULT_FILE_NAME: &str = "cold-calling-data.json";

/// Source of file locations chosen by the user.
pub trait FilePicker: Send + Sync {
    /// Whether a dialog can be shown at all.
    fn is_supported(&self) -> bool;

    fn pick_save(&self, suggested_name: &str) -> Option<PathBuf>;

    fn pick_open(&self) -> Option<PathBuf>;
}

/// Native dialogs via `rfd`.
pub struct NativePicker;

impl FilePicker for NativePicker {
    fn is_supported(&self) -> bool {
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            return true;
        }
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    }

    fn pick_save(&self, suggested_name: &str) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("JSON files", &["json"])
            .set_title("Save cold-calling data")
            .set_file_name(suggested_name)
            .save_file()
    }

    fn pick_open(&self) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("JSON files", &["json"])
            .set_title("Open cold-calling data")
            .pick_file()
    }
}

/// Where an explicit save ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// The user picked this file; later autosaves go here too.
    Chosen(PathBuf),
    /// No dialog was available; the snapshot was written to the downloads directory.
    Downloaded(PathBuf),
}

impl SaveTarget {
    pub fn path(&self) -> &Path {
        match self {
            Self::Chosen(p) | Self::Downloaded(p) => p,
        }
    }
}

/// Read a backup snapshot from disk.
pub fn read_snapshot(path: &Path) -> StorageResult<Snapshot> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a backup snapshot as pretty-printed JSON.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(snapshot)?)?;
    Ok(())
}

#[derive(Default)]
struct FileCache {
    primed: bool,
    companies: Vec<Company>,
    settings: Settings,
}

pub struct FileBackend {
    picker: Box<dyn FilePicker>,
    download_dir: PathBuf,
    handle: Mutex<Option<PathBuf>>,
    cache: Mutex<FileCache>,
}

impl FileBackend {
    pub fn new(picker: Box<dyn FilePicker>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            picker,
            download_dir: download_dir.into(),
            handle: Mutex::new(None),
            cache: Mutex::new(FileCache::default()),
        }
    }

    /// Resume writing to a file chosen in an earlier session.
    pub fn with_handle(self, path: Option<PathBuf>) -> Self {
        if let Ok(mut handle) = self.handle.lock() {
            *handle = path;
        }
        self
    }

    pub fn handle(&self) -> Option<PathBuf> {
        self.handle.lock().ok().and_then(|h| h.clone())
    }

    fn set_handle(&self, path: PathBuf) -> StorageResult<()> {
        *self.handle.lock().map_err(|_| StorageError::Poisoned)? = Some(path);
        // a new file means the cached view of the old one is stale
        *self.cache()? = FileCache::default();
        Ok(())
    }

    fn cache(&self) -> StorageResult<MutexGuard<'_, FileCache>> {
        self.cache.lock().map_err(|_| StorageError::Poisoned)
    }

    fn require_handle(&self) -> StorageResult<PathBuf> {
        self.handle().ok_or(StorageError::NoFileSelected)
    }

    /// Cache of the chosen file's contents, read from disk on first use.
    fn primed_cache(&self, path: &Path) -> StorageResult<MutexGuard<'_, FileCache>> {
        let mut cache = self.cache()?;
        if !cache.primed {
            match read_snapshot(path) {
                Ok(snapshot) => {
                    cache.companies = snapshot.companies;
                    cache.settings = snapshot.settings;
                }
                Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(StorageError::Json(e)) => {
                    warn!(path = %path.display(), error = %e, "storage file is corrupt, treating it as empty");
                }
                Err(e) => return Err(e),
            }
            cache.primed = true;
        }
        Ok(cache)
    }

    fn write_cache(path: &Path, cache: &FileCache) -> StorageResult<()> {
        let snapshot = Snapshot::new(cache.companies.clone(), cache.settings.clone());
        write_snapshot(path, &snapshot)
    }

    /// Explicit save: ask for a file and write the snapshot there.
    ///
    /// Without a usable dialog the snapshot is written into the downloads
    /// directory instead of failing.
    pub fn save_data(&self, snapshot: &Snapshot, file_name: &str) -> StorageResult<SaveTarget> {
        if !self.picker.is_supported() {
            return self.download_as_file(snapshot, file_name).map(SaveTarget::Downloaded);
        }

        let path = self.picker.pick_save(file_name).ok_or(StorageError::Cancelled)?;
        write_snapshot(&path, snapshot)?;
        self.set_handle(path.clone())?;
        {
            let mut cache = self.cache()?;
            cache.companies = snapshot.companies.clone();
            cache.settings = snapshot.settings.clone();
            cache.primed = true;
        }
        info!(path = %path.display(), "data saved to file");
        Ok(SaveTarget::Chosen(path))
    }

    /// Explicit load: ask for a file and read its snapshot.
    ///
    /// Returns `Ok(None)` when the user cancels the dialog.
    pub fn load_data(&self) -> StorageResult<Option<(PathBuf, Snapshot)>> {
        if !self.picker.is_supported() {
            return Err(StorageError::Unsupported("file dialogs"));
        }
        let Some(path) = self.picker.pick_open() else {
            return Ok(None);
        };

        let snapshot = read_snapshot(&path)?;
        self.set_handle(path.clone())?;
        {
            let mut cache = self.cache()?;
            cache.companies = snapshot.companies.clone();
            cache.settings = snapshot.settings.clone();
            cache.primed = true;
        }
        info!(path = %path.display(), "data loaded from file");
        Ok(Some((path, snapshot)))
    }

    /// Rewrite the chosen file, if there is one. Returns whether anything was written.
    pub fn autosave(&self, snapshot: &Snapshot) -> StorageResult<bool> {
        let Some(path) = self.handle() else {
            return Ok(false);
        };
        write_snapshot(&path, snapshot)?;
        let mut cache = self.cache()?;
        cache.companies = snapshot.companies.clone();
        cache.settings = snapshot.settings.clone();
        cache.primed = true;
        Ok(true)
    }

    /// Write the snapshot into the downloads directory under `file_name`.
    pub fn download_as_file(&self, snapshot: &Snapshot, file_name: &str) -> StorageResult<PathBuf> {
        let path = self.download_dir.join(file_name);
        write_snapshot(&path, snapshot)?;
        info!(path = %path.display(), "data written to downloads");
        Ok(path)
    }
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    async fn save_all(&self, companies: &[Company]) -> StorageResult<()> {
        let path = self.require_handle()?;
        let mut cache = self.primed_cache(&path)?;
        cache.companies = companies.to_vec();
        Self::write_cache(&path, &cache)
    }

    async fn load_all(&self) -> StorageResult<Vec<Company>> {
        let path = self.require_handle()?;
        let cache = self.primed_cache(&path)?;
        Ok(cache.companies.clone())
    }

    async fn save_setting(&self, key: SettingKey, value: i64) -> StorageResult<()> {
        let path = self.require_handle()?;
        let mut cache = self.primed_cache(&path)?;
        cache.settings.set(key, value);
        Self::write_cache(&path, &cache)
    }

    async fn load_setting(&self, key: SettingKey) -> StorageResult<Option<i64>> {
        let path = self.require_handle()?;
        let cache = self.primed_cache(&path)?;
        Ok(cache.settings.get(key))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Picker that answers with fixed paths.
    pub(crate) struct FixedPicker {
        pub supported: bool,
        pub save: Option<PathBuf>,
        pub open: Option<PathBuf>,
    }

    impl FilePicker for FixedPicker {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn pick_save(&self, _suggested_name: &str) -> Option<PathBuf> {
            self.save.clone()
        }

        fn pick_open(&self) -> Option<PathBuf> {
            self.open.clone()
        }
    }

    fn backend(dir: &TempDir, picker: FixedPicker) -> FileBackend {
        FileBackend::new(Box::new(picker), dir.path().join("downloads"))
    }

    fn snapshot_of(titles: &[&str]) -> Snapshot {
        let companies = titles.iter().map(|t| Company::new(t.to_string())).collect();
        Snapshot::new(companies, Settings::default())
    }

    #[tokio::test]
    async fn contract_calls_fail_before_a_file_is_chosen() {
        let dir = TempDir::new().unwrap();
        let file = backend(&dir, FixedPicker { supported: true, save: None, open: None });

        assert!(matches!(file.save_all(&[]).await, Err(StorageError::NoFileSelected)));
        assert!(matches!(file.load_all().await, Err(StorageError::NoFileSelected)));
        assert!(matches!(
            file.save_setting(SettingKey::DialerPosition, 1).await,
            Err(StorageError::NoFileSelected)
        ));
        assert!(!file.autosave(&snapshot_of(&["Acme"])).unwrap());
    }

    #[tokio::test]
    async fn explicit_save_then_contract_writes_go_to_chosen_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("leads.json");
        let file = backend(
            &dir,
            FixedPicker { supported: true, save: Some(target.clone()), open: None },
        );

        let snapshot = snapshot_of(&["Acme", "Globex"]);
        let saved = file.save_data(&snapshot, DEFAULT_FILE_NAME).unwrap();
        assert_eq!(saved, SaveTarget::Chosen(target.clone()));
        assert_eq!(file.handle(), Some(target.clone()));

        file.save_setting(SettingKey::CallClicks, 5).await.unwrap();
        let on_disk = read_snapshot(&target).unwrap();
        assert_eq!(on_disk.companies, snapshot.companies);
        assert_eq!(on_disk.settings.call_clicks, Some(5));

        file.save_all(&snapshot.companies[..1]).await.unwrap();
        let on_disk = read_snapshot(&target).unwrap();
        assert_eq!(on_disk.companies.len(), 1);
        assert_eq!(on_disk.settings.call_clicks, Some(5));
    }

    #[tokio::test]
    async fn cancelled_dialog_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let file = backend(&dir, FixedPicker { supported: true, save: None, open: None });

        let result = file.save_data(&snapshot_of(&["Acme"]), DEFAULT_FILE_NAME);
        assert!(matches!(result, Err(StorageError::Cancelled)));
        assert!(file.handle().is_none());
        assert!(file.load_data().unwrap().is_none());
    }

    #[test]
    fn unsupported_dialog_downloads_instead() {
        let dir = TempDir::new().unwrap();
        let file = backend(&dir, FixedPicker { supported: false, save: None, open: None });

        let saved = file.save_data(&snapshot_of(&["Acme"]), "backup.json").unwrap();
        let expected = dir.path().join("downloads").join("backup.json");
        assert_eq!(saved, SaveTarget::Downloaded(expected.clone()));
        assert!(expected.exists());
        assert!(file.handle().is_none());
        assert!(matches!(file.load_data(), Err(StorageError::Unsupported(_))));
    }

    #[tokio::test]
    async fn load_data_adopts_the_opened_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("existing.json");
        let snapshot = snapshot_of(&["Initech"]);
        write_snapshot(&source, &snapshot).unwrap();

        let file = backend(
            &dir,
            FixedPicker { supported: true, save: None, open: Some(source.clone()) },
        );
        let (path, loaded) = file.load_data().unwrap().unwrap();
        assert_eq!(path, source);
        assert_eq!(loaded.companies, snapshot.companies);
        assert_eq!(file.load_all().await.unwrap(), snapshot.companies);
    }

    #[tokio::test]
    async fn remembered_handle_reads_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.json");
        let snapshot = snapshot_of(&["Acme"]);
        write_snapshot(&path, &snapshot).unwrap();

        let file = backend(&dir, FixedPicker { supported: false, save: None, open: None })
            .with_handle(Some(path));
        assert_eq!(file.load_all().await.unwrap(), snapshot.companies);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.json");
        std::fs::write(&path, "{\"companies\": [").unwrap();

        let file = backend(&dir, FixedPicker { supported: false, save: None, open: None })
            .with_handle(Some(path));
        assert!(file.load_all().await.unwrap().is_empty());
    }
}
