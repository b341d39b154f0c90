use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::dialer::DEFAULT_CALL_URL_BASE;
use crate::storage::file::DEFAULT_FILE_NAME;
use crate::storage::BackendKind;

const APP_NAME: &str = "coldcall";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DB_FILE_NAME: &str = "coldcall.db";
pub const KV_FILE_NAME: &str = "store.json";

/// Settings read from `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Primary storage backend.
    pub backend: BackendKind,
    /// Where the database and key-value files live. Defaults to the config directory.
    pub data_dir: Option<PathBuf>,
    /// Where snapshots go when no file dialog is available.
    pub download_dir: Option<PathBuf>,
    pub autosave_interval_secs: u64,
    pub notes_debounce_ms: u64,
    pub auto_advance_delay_ms: u64,
    pub call_url_base: String,
    pub data_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: None,
            download_dir: None,
            autosave_interval_secs: 30,
            notes_debounce_ms: 500,
            auto_advance_delay_ms: 500,
            call_url_base: DEFAULT_CALL_URL_BASE.to_string(),
            data_file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(config_root()?.join(CONFIG_FILE_NAME))
    }

    /// Apply `COLDCALL_BACKEND` and `COLDCALL_DATA_DIR`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(backend) = var("COLDCALL_BACKEND").filter(|v| !v.trim().is_empty()) {
            self.backend = backend.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(dir) = var("COLDCALL_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => config_root(),
        }
    }

    pub fn download_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.download_dir {
            return Ok(dir.clone());
        }
        dirs::download_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("Could not find a downloads directory"))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE_NAME))
    }

    pub fn kv_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(KV_FILE_NAME))
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn notes_debounce(&self) -> Duration {
        Duration::from_millis(self.notes_debounce_ms)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }
}

fn config_root() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config_dir.join(APP_NAME))
}
