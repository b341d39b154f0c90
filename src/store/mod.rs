//! The canonical in-memory company list.
//!
//! [`RecordStore`] owns the list and is the only writer: every mutation is
//! persisted through its [`BackendChain`] before returning. Settings are read
//! and written through the same chain.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::address::{resolve_location, Location};
use crate::models::{Company, CompanyFilter, Disposition, EditableField, SettingKey, Settings, Snapshot};
use crate::storage::{BackendChain, SaveReport};

mod import;

pub use import::{company_from_raw, parse_import, RawItem};

/// Store shared between the CLI, the dialer and background tasks.
pub type SharedStore = Arc<Mutex<RecordStore>>;

/// Malformed import or backup input. The store is left unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of companies")]
    NotAnArray,

    #[error("item {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("duplicate company id \"{0}\"")]
    DuplicateId(String),
}

/// Outcome of [`RecordStore::import_records`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    /// Distinct states among the added records, sorted.
    pub states: Vec<String>,
    pub save: SaveReport,
}

/// City and state as they would be derived from a record's source data.
fn derived_location(company: &Company) -> Location {
    resolve_location(
        company.original_str("city"),
        company.original_str("state"),
        company.original_address(),
    )
}

pub struct RecordStore {
    companies: Vec<Company>,
    backends: BackendChain,
}

impl RecordStore {
    /// An empty store writing to `backends`.
    pub fn new(backends: BackendChain) -> Self {
        Self {
            companies: Vec::new(),
            backends,
        }
    }

    /// A store holding whatever the chain has saved.
    pub async fn load(backends: BackendChain) -> Self {
        let companies = backends.load_all().await;
        debug!(count = companies.len(), backend = %backends.primary_kind(), "record store loaded");
        Self {
            companies,
            backends,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn backends(&self) -> &BackendChain {
        &self.backends
    }

    /// Persist the full list.
    pub async fn save(&self) -> SaveReport {
        let report = self.backends.save_all(&self.companies).await;
        if !report.is_saved() {
            warn!(count = self.companies.len(), "companies could not be saved to any backend");
        }
        report
    }

    // ==================== READ ====================

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Company> {
        self.companies.iter_mut().find(|c| c.id == id)
    }

    pub fn filtered(&self, filter: &CompanyFilter) -> Vec<&Company> {
        self.companies.iter().filter(|c| filter.matches(c)).collect()
    }

    /// Index of `id` within the filtered list, for opening it in the dialer.
    pub fn position_in(&self, filter: &CompanyFilter, id: &str) -> Option<usize> {
        self.companies
            .iter()
            .filter(|c| filter.matches(c))
            .position(|c| c.id == id)
    }

    pub fn cities(&self) -> Vec<String> {
        self.companies
            .iter()
            .filter_map(|c| c.city.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn states(&self) -> Vec<String> {
        self.companies
            .iter()
            .filter_map(|c| c.state.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Lead count per status, "not called" first, then each disposition.
    pub fn disposition_counts(&self) -> Vec<(Option<Disposition>, usize)> {
        std::iter::once(None)
            .chain(Disposition::all().iter().copied().map(Some))
            .map(|status| {
                let count = self.companies.iter().filter(|c| c.disposition == status).count();
                (status, count)
            })
            .collect()
    }

    // ==================== WRITE ====================

    /// Append one new record per raw item and persist.
    pub async fn import_records(&mut self, items: Vec<RawItem>) -> ImportSummary {
        let added: Vec<Company> = items.iter().map(company_from_raw).collect();
        let states = added
            .iter()
            .filter_map(|c| c.state.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let count = added.len();
        self.companies.extend(added);
        let save = self.save().await;
        info!(added = count, total = self.companies.len(), "imported companies");

        ImportSummary {
            added: count,
            states,
            save,
        }
    }

    pub async fn update_disposition(
        &mut self,
        id: &str,
        disposition: Option<Disposition>,
    ) -> Option<SaveReport> {
        self.get_mut(id)?.disposition = disposition;
        Some(self.save().await)
    }

    pub async fn update_notes(&mut self, id: &str, notes: String) -> Option<SaveReport> {
        self.get_mut(id)?.notes = notes;
        Some(self.save().await)
    }

    /// Set a contact field; a blank value clears it.
    pub async fn update_field(
        &mut self,
        id: &str,
        field: EditableField,
        value: &str,
    ) -> Option<SaveReport> {
        let value = Some(value.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self.get_mut(id)?.set_field(field, value);
        Some(self.save().await)
    }

    /// Fill city and state for records that have neither. Returns how many changed.
    pub async fn backfill_missing_location(&mut self) -> usize {
        let mut updated = 0;
        for company in &mut self.companies {
            if company.city.is_some() || company.state.is_some() {
                continue;
            }
            let location = derived_location(company);
            if !location.is_empty() {
                company.city = location.city;
                company.state = location.state;
                updated += 1;
            }
        }

        if updated > 0 {
            debug!(updated, "backfilled missing locations");
            self.save().await;
        }
        updated
    }

    /// Re-derive every record's location from its source data.
    pub async fn reparse_all_addresses(&mut self) -> usize {
        let mut updated = 0;
        for company in &mut self.companies {
            let location = derived_location(company);
            if location.city != company.city || location.state != company.state {
                company.city = location.city;
                company.state = location.state;
                updated += 1;
            }
        }

        if updated > 0 {
            info!(updated, "re-parsed company addresses");
            self.save().await;
        }
        updated
    }

    /// More than half of the records with a source address have no state.
    pub fn needs_reparse(&self) -> bool {
        let with_address: Vec<_> = self
            .companies
            .iter()
            .filter(|c| c.original_address().is_some())
            .collect();
        if with_address.is_empty() {
            return false;
        }

        let missing = with_address.iter().filter(|c| c.state.is_none()).count();
        missing * 2 > with_address.len()
    }

    // ==================== SNAPSHOTS ====================

    pub async fn export_snapshot(&self) -> Snapshot {
        let mut settings = Settings::default();
        for key in SettingKey::all() {
            if let Some(value) = self.setting(*key).await {
                settings.set(*key, value);
            }
        }
        Snapshot::new(self.companies.clone(), settings)
    }

    /// Replace the whole list with a backup and merge its settings.
    pub async fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<SaveReport, StoreError> {
        let mut seen = HashSet::new();
        if let Some(dup) = snapshot.companies.iter().find(|c| !seen.insert(c.id.as_str())) {
            return Err(StoreError::DuplicateId(dup.id.clone()));
        }

        self.companies = snapshot.companies;
        let report = self.save().await;
        for (key, value) in snapshot.settings.present() {
            self.set_setting(key, value).await;
        }
        info!(count = self.companies.len(), "backup restored");
        Ok(report)
    }

    // ==================== SETTINGS ====================

    pub async fn setting(&self, key: SettingKey) -> Option<i64> {
        self.backends.load_setting(key).await
    }

    pub async fn set_setting(&self, key: SettingKey, value: i64) -> SaveReport {
        let report = self.backends.save_setting(key, value).await;
        if !report.is_saved() {
            warn!(key = key.as_str(), "setting could not be saved to any backend");
        }
        report
    }

    /// Add one to a counter setting, returning the new value.
    pub async fn increment_setting(&self, key: SettingKey) -> (i64, SaveReport) {
        let value = self.setting(key).await.unwrap_or(0) + 1;
        (value, self.set_setting(key, value).await)
    }
}
