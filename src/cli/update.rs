use anyhow::{anyhow, Result};

use crate::app::App;
use crate::cli::ui::{find_company_by_identifier, prompt_field, report_save, FormResult};
use crate::models::{status_label, Disposition, EditableField};

/// `none`, `clear` and `not-called` remove the disposition.
pub fn parse_disposition_arg(s: &str) -> Result<Option<Disposition>> {
    match s.trim().to_lowercase().as_str() {
        "none" | "clear" | "not-called" => Ok(None),
        other => Disposition::parse(other)
            .map(Some)
            .ok_or_else(|| anyhow!("Unknown disposition \"{}\"", s)),
    }
}

/// Execute the dispose command.
pub async fn run_dispose(app: &App, identifier: &str, disposition: &str) -> Result<()> {
    let disposition = parse_disposition_arg(disposition)?;
    let store = app.store();
    let mut store = store.lock().await;

    let Some(id) = tokio::task::block_in_place(|| find_company_by_identifier(&store, identifier))? else {
        println!("No company found.");
        return Ok(());
    };
    if let Some(report) = store.update_disposition(&id, disposition).await {
        println!("Status: {}", status_label(disposition));
        report_save(&report);
    }
    Ok(())
}

/// Execute the note command.
pub async fn run_note(app: &App, identifier: &str, text: Option<String>) -> Result<()> {
    let store = app.store();
    let mut store = store.lock().await;

    let Some(id) = tokio::task::block_in_place(|| find_company_by_identifier(&store, identifier))? else {
        println!("No company found.");
        return Ok(());
    };
    let current = store.get(&id).map(|c| c.notes.clone()).unwrap_or_default();

    let notes = match text {
        Some(text) => text,
        None => match tokio::task::block_in_place(|| prompt_field("notes", Some(&current)))? {
            FormResult::Value(v) => v,
            FormResult::Cancelled => {
                println!("Cancelled.");
                return Ok(());
            }
        },
    };

    if notes != current {
        if let Some(report) = store.update_notes(&id, notes).await {
            println!("Saved.");
            report_save(&report);
        }
    }
    Ok(())
}

/// Execute the edit command.
pub async fn run_edit(app: &App, identifier: &str, field: &str, value: Option<String>) -> Result<()> {
    let field = EditableField::parse(field).ok_or_else(|| {
        anyhow!("Unknown field \"{}\" (phone, website, email, contact)", field)
    })?;
    let store = app.store();
    let mut store = store.lock().await;

    let Some(id) = tokio::task::block_in_place(|| find_company_by_identifier(&store, identifier))? else {
        println!("No company found.");
        return Ok(());
    };

    let value = match value {
        Some(value) => value,
        None => {
            let current = store.get(&id).and_then(|c| c.field(field)).map(str::to_string);
            match tokio::task::block_in_place(|| prompt_field(field.as_str(), current.as_deref()))? {
                FormResult::Value(v) => v,
                FormResult::Cancelled => {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }
    };

    if let Some(report) = store.update_field(&id, field, &value).await {
        println!("Saved.");
        report_save(&report);
    }
    Ok(())
}
