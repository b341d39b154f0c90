use anyhow::Result;

use crate::app::{format_bytes, App};
use crate::models::status_label;

/// Execute the info command.
pub async fn run_info(app: &App) -> Result<()> {
    let info = app.storage_info().await;

    println!("Storage: {}", info.backend.label());
    let chain: Vec<_> = info.chain.iter().map(|k| k.as_str()).collect();
    println!("  order: {}", chain.join(" > "));
    println!("  companies: {}", info.companies);

    if let Some(path) = &info.db_path {
        let size = info.db_size.map(format_bytes).unwrap_or_else(|| "-".to_string());
        println!("  database: {} ({})", path.display(), size);
    }
    if let Some(path) = &info.kv_path {
        let size = info.kv_size.map(format_bytes).unwrap_or_else(|| "-".to_string());
        println!("  key-value: {} ({})", path.display(), size);
    }
    match &info.file_path {
        Some(path) => println!("  file: {}", path.display()),
        None => println!("  file: none chosen"),
    }
    if let Some(saved) = info.last_saved {
        println!(
            "  last saved: {}",
            saved.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }

    println!("  calls: {}", app.call_clicks().await);

    let store = app.store();
    let store = store.lock().await;
    if !store.is_empty() {
        println!();
        for (status, count) in store.disposition_counts() {
            if count > 0 {
                println!("  {:<16}{}", status_label(status), count);
            }
        }
    }
    Ok(())
}

/// Execute the reparse command.
pub async fn run_reparse(app: &App) -> Result<()> {
    let store = app.store();
    let mut store = store.lock().await;
    let updated = store.reparse_all_addresses().await;

    if updated == 0 {
        println!("All addresses already parsed.");
    } else {
        println!("Re-parsed {} addresses.", updated);
    }
    let states = store.states();
    if !states.is_empty() {
        println!("  states: {}", states.join(", "));
    }
    Ok(())
}
