use anyhow::Result;

use crate::app::App;
use crate::cli::display::print_company;
use crate::cli::ui::find_company_by_identifier;

/// Execute the show command.
pub async fn run_show(app: &App, identifier: &str) -> Result<()> {
    let store = app.store();
    let store = store.lock().await;

    let Some(id) = tokio::task::block_in_place(|| find_company_by_identifier(&store, identifier))? else {
        println!("No company found.");
        return Ok(());
    };
    if let Some(company) = store.get(&id) {
        print_company(company);
        println!("\n  id: {}", company.id);
    }
    Ok(())
}
