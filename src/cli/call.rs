use anyhow::{bail, Result};
use tracing::warn;

use crate::app::App;
use crate::cli::ui::{find_company_by_identifier, report_save};
use crate::dialer::call_url;

/// Open the call link in the system browser and count the click.
pub async fn open_call(app: &App, phone: &str) -> Result<String> {
    let Some(url) = call_url(&app.config().call_url_base, phone) else {
        bail!("No dialable number in \"{}\"", phone);
    };
    if let Err(e) = webbrowser::open(&url) {
        warn!(error = %e, "failed to open browser");
        println!("Open this link to call: {}", url);
    }
    app.record_call().await;
    Ok(url)
}

/// Execute the call command.
pub async fn run_call(app: &App, identifier: &str) -> Result<()> {
    let phone = {
        let store = app.store();
        let store = store.lock().await;
        let Some(id) = tokio::task::block_in_place(|| find_company_by_identifier(&store, identifier))? else {
            println!("No company found.");
            return Ok(());
        };
        match store.get(&id).and_then(|c| c.phone.clone()) {
            Some(phone) => phone,
            None => {
                println!("No phone number.");
                return Ok(());
            }
        }
    };

    open_call(app, &phone).await?;
    println!("Calling {}", phone);
    Ok(())
}

/// Execute the clicks command.
pub async fn run_clicks(app: &App, reset: bool) -> Result<()> {
    if reset {
        report_save(&app.reset_call_clicks().await);
        println!("Reset.");
        return Ok(());
    }
    println!("{} calls", app.call_clicks().await);
    Ok(())
}
