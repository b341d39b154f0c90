use std::path::PathBuf;

use anyhow::{bail, Result};
use rfd::FileDialog;

use crate::app::App;
use crate::cli::ui::report_save;
use crate::store::ImportSummary;

/// Opens a native file picker dialog to select a JSON export.
/// Returns `None` if the user cancels the dialog.
pub fn pick_json_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("JSON files", &["json"])
        .set_title("Select leads file to import")
        .pick_file()
}

/// Execute the upload command.
pub async fn run_upload(app: &App, file: Option<PathBuf>) -> Result<()> {
    let path = match file {
        Some(path) => path,
        None => match tokio::task::block_in_place(pick_json_file) {
            Some(path) => path,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        },
    };
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    eprintln!("Importing: {}", path.display());
    let summary = app.import_file(&path).await?;
    print_summary(&summary);
    report_save(&summary.save);
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    println!("\nImported {} companies", summary.added);
    if !summary.states.is_empty() {
        println!("  states: {}", summary.states.join(", "));
    }
}
