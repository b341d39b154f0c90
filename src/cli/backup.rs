use std::path::Path;

use anyhow::Result;

use crate::app::App;
use crate::cli::ui::{confirm, report_save};
use crate::storage::file::SaveTarget;
use crate::storage::StorageError;

/// Execute the export command.
pub async fn run_export(app: &App, path: Option<&Path>) -> Result<()> {
    let written = app.export_backup(path).await?;
    println!("Exported to {}", written.display());
    Ok(())
}

/// Execute the restore command.
pub async fn run_restore(app: &App, path: &Path, interactive: bool) -> Result<()> {
    let count = app.store().lock().await.len();
    if interactive && count > 0 {
        let prompt = format!("Replace {} companies with {}?", count, path.display());
        if !tokio::task::block_in_place(|| confirm(&prompt))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = app.import_backup(path).await?;
    println!("Restored {} companies.", app.store().lock().await.len());
    report_save(&report);
    Ok(())
}

/// Execute the save command.
pub async fn run_save(app: &mut App) -> Result<()> {
    match app.save_to_file().await {
        Ok(SaveTarget::Chosen(path)) => println!("Saved to {}", path.display()),
        Ok(SaveTarget::Downloaded(path)) => {
            println!("File dialogs are not available here. Downloaded to {}", path.display())
        }
        Err(e) if matches!(e.downcast_ref::<StorageError>(), Some(StorageError::Cancelled)) => {
            println!("Cancelled.")
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Execute the load command.
pub async fn run_load(app: &mut App) -> Result<()> {
    match app.load_from_file().await? {
        Some((path, report)) => {
            println!(
                "Loaded {} companies from {}",
                app.store().lock().await.len(),
                path.display()
            );
            report_save(&report);
        }
        None => println!("Cancelled."),
    }
    Ok(())
}
