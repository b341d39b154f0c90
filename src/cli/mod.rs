use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};

use crate::models::{CompanyFilter, StatusFilter};
use crate::storage::BackendKind;

pub mod backup;
pub mod call;
pub mod dial;
pub mod display;
pub mod import;
pub mod info;
pub mod list;
pub mod menu;
pub mod show;
pub mod ui;
pub mod update;

pub use backup::{run_export, run_load, run_restore, run_save};
pub use call::{run_call, run_clicks};
pub use dial::run_dial;
pub use import::run_upload;
pub use info::{run_info, run_reparse};
pub use list::run_list;
pub use menu::run_menu;
pub use show::run_show;
pub use update::{run_dispose, run_edit, run_note};

#[derive(Parser)]
#[command(name = "coldcall")]
#[command(about = "Cold-calling lead manager and power dialer")]
#[command(version)]
pub struct Cli {
    /// Storage backend: sqlite, file or kv
    #[arg(long, global = true, value_name = "BACKEND")]
    pub backend: Option<BackendKind>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import leads from a JSON export
    Upload(UploadArgs),
    /// List leads in the directory
    List(ListArgs),
    /// Show full details for a lead
    Show(IdentifierArgs),
    /// Set or clear a lead's disposition
    Dispose(DisposeArgs),
    /// Replace a lead's notes
    Note(NoteArgs),
    /// Edit a lead's phone, website, email or contact
    Edit(EditArgs),
    /// Open the call link for a lead
    Call(IdentifierArgs),
    /// Show or reset the call link counter
    Clicks(ClicksArgs),
    /// Work through leads one by one
    Dial(DialArgs),
    /// Export a backup of all leads and settings
    Export(ExportArgs),
    /// Restore a backup, replacing all leads
    Restore(RestoreArgs),
    /// Save all data to a file of your choice
    Save,
    /// Load all data from a file of your choice
    Load,
    /// Re-derive city and state from every lead's address
    Reparse,
    /// Show storage details
    Info,
}

#[derive(Args)]
pub struct UploadArgs {
    /// JSON file to import (opens a file picker if omitted)
    pub file: Option<PathBuf>,
}

/// Directory filter flags shared by `list` and `dial`.
#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// all, not-called, or a disposition (sold, voicemail, ...)
    #[arg(short, long, default_value = "all")]
    pub status: String,
    #[arg(short, long)]
    pub city: Option<String>,
    /// State code or name
    #[arg(long)]
    pub state: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<CompanyFilter> {
        let status = StatusFilter::parse(&self.status)
            .ok_or_else(|| anyhow!("Unknown status \"{}\"", self.status))?;
        Ok(CompanyFilter {
            status,
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            state: self
                .state
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(crate::address::normalize_state_name),
        })
    }
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Print all rows without paging
    #[arg(short, long)]
    pub all: bool,
    /// Write CSV to stdout
    #[arg(long)]
    pub csv: bool,
}

#[derive(Args)]
pub struct IdentifierArgs {
    /// Lead id or part of its name
    pub identifier: String,
}

#[derive(Args)]
pub struct DisposeArgs {
    pub identifier: String,
    /// not-available, not-interested, voicemail, wrong-number, call-back, sold, or none
    pub disposition: String,
}

#[derive(Args)]
pub struct NoteArgs {
    pub identifier: String,
    /// New notes (prompts if omitted)
    pub text: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    pub identifier: String,
    /// phone, website, email or contact
    pub field: String,
    /// New value; empty clears the field (prompts if omitted)
    pub value: Option<String>,
}

#[derive(Args)]
pub struct ClicksArgs {
    /// Reset the counter to zero
    #[arg(long)]
    pub reset: bool,
}

#[derive(Args)]
pub struct DialArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Start at this lead (1-based) instead of the saved position
    #[arg(long)]
    pub at: Option<usize>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (defaults to the downloads directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreArgs {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Disposition;

    #[test]
    fn test_parse_global_backend() {
        let cli = Cli::parse_from(["coldcall", "list", "--backend", "kv", "--status", "sold"]);
        assert_eq!(cli.backend, Some(BackendKind::KeyValue));
        let Some(Commands::List(args)) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(
            args.filter.to_filter().unwrap().status,
            StatusFilter::Is(Disposition::Sold)
        );
    }

    #[test]
    fn test_filter_normalizes_state() {
        let args = FilterArgs {
            status: "not-called".to_string(),
            city: Some(" ".to_string()),
            state: Some("north carolina".to_string()),
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.status, StatusFilter::NotCalled);
        assert_eq!(filter.city, None);
        assert_eq!(filter.state.as_deref(), Some("NC"));
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let args = FilterArgs {
            status: "maybe".to_string(),
            ..Default::default()
        };
        assert!(args.to_filter().is_err());
    }

    #[test]
    fn test_invalid_backend_is_rejected() {
        assert!(Cli::try_parse_from(["coldcall", "--backend", "cloud", "info"]).is_err());
    }
}
