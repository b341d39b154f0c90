//! Interactive power dialer.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::KeyCode;
use tokio::task::JoinHandle;

use crate::app::App;
use crate::cli::call::open_call;
use crate::cli::display::print_company;
use crate::cli::ui::{clear_screen, poll_key, prompt_field, read_key, report_save, select, text_input, FormResult};
use crate::cli::DialArgs;
use crate::dialer::{reschedule_advance, DialerSession, NoteDebouncer, SharedSession};
use crate::models::{CompanyFilter, Disposition, EditableField, SettingKey};
use crate::store::SharedStore;

const KEY_POLL: Duration = Duration::from_millis(50);

const HELP: &str = r#"
NAVIGATION

  → / l / Enter   Next lead
  ← / h           Previous lead
  g / G           Jump to first / last

STATUS

  1  Not Available     4  Wrong Number
  2  Not Interested    5  Call Back
  3  Voicemail         6  Sold
  0  Clear

  Voicemail and Wrong Number move to the next lead.

ACTIONS

  c               Call
  n               Edit notes
  e               Edit phone, website, email or contact

EXIT

  q / Esc         Quit
  ?               This help screen
"#;

/// Execute the dial command.
pub async fn run_dial(app: &App, args: &DialArgs) -> Result<()> {
    let filter = args.filter.to_filter()?;
    let start = args.at.map(|n| n.saturating_sub(1));
    run_dial_at(app, &filter, start).await
}

/// Dial through the companies matching `filter`, starting at `start` or the saved position.
pub async fn run_dial_at(app: &App, filter: &CompanyFilter, start: Option<usize>) -> Result<()> {
    let store = app.store();
    let (ids, saved) = {
        let store = store.lock().await;
        let ids: Vec<String> = store.filtered(filter).iter().map(|c| c.id.clone()).collect();
        (ids, store.setting(SettingKey::DialerPosition).await)
    };
    if ids.is_empty() {
        println!("No companies to dial.");
        return Ok(());
    }

    let session = match start {
        Some(index) => DialerSession::new(ids, Some(index as i64)),
        None => DialerSession::new(ids, saved),
    };
    // shown until the user moves off the restored lead
    let resumed_at = (start.is_none() && session.index() > 0).then(|| session.index());
    let session = session.into_shared();
    if start.is_some() {
        save_position(&store, &session).await;
    }

    let mut notes = NoteDebouncer::new(store.clone(), app.config().notes_debounce());
    let mut pending: Option<JoinHandle<bool>> = None;
    let mut message: Option<String> = None;

    loop {
        let (index, id, progress) = {
            let session = session.lock().await;
            match session.current_id() {
                Some(id) => (session.index(), id.to_string(), session.progress()),
                None => break,
            }
        };

        {
            let store = store.lock().await;
            let Some(company) = store.get(&id) else {
                break;
            };
            clear_screen()?;
            let resumed = if resumed_at == Some(index) { "  (resumed)" } else { "" };
            println!("Lead {} of {}{}\n", progress.0, progress.1, resumed);
            print_company(company);
        }
        if let Some(msg) = message.take() {
            println!("\n{}", msg);
        }
        print!("\n{}/{}  [←/→] [1-6] status [0] clear [c]all [n]otes [e]dit [?] [q]uit: ", progress.0, progress.1);
        std::io::Write::flush(&mut std::io::stdout())?;

        let key = match pending.take() {
            Some(handle) => match wait_for_key_or_advance(handle).await? {
                KeyOrAdvance::Key(key, handle) => {
                    pending = Some(handle);
                    key
                }
                KeyOrAdvance::Advanced(moved) => {
                    if moved {
                        notes.flush().await;
                        save_position(&store, &session).await;
                    }
                    continue;
                }
            },
            None => tokio::task::block_in_place(read_key)?,
        };

        match key {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
                if session.lock().await.is_last() {
                    message = Some("Last lead.".to_string());
                } else {
                    navigate(&store, &session, &mut notes, |s| s.next()).await;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if session.lock().await.is_first() {
                    message = Some("First lead.".to_string());
                } else {
                    navigate(&store, &session, &mut notes, |s| s.prev()).await;
                }
            }
            KeyCode::Char('g') => {
                navigate(&store, &session, &mut notes, |s| s.jump(0)).await;
            }
            KeyCode::Char('G') => {
                navigate(&store, &session, &mut notes, |s| {
                    let last = s.len().saturating_sub(1);
                    s.jump(last)
                })
                .await;
            }
            KeyCode::Char(c @ '0'..='6') => {
                let disposition = match c {
                    '0' => None,
                    n => Disposition::all().get(n as usize - '1' as usize).copied(),
                };
                if let Some(report) = store.lock().await.update_disposition(&id, disposition).await {
                    report_save(&report);
                }
                if let Some(d) = disposition.filter(|d| d.auto_advances()) {
                    message = Some(format!("{}. Moving to next lead...", d.label()));
                    pending = Some(reschedule_advance(
                        pending.take(),
                        session.clone(),
                        index,
                        app.config().auto_advance_delay(),
                    ));
                }
            }
            KeyCode::Char('c') => {
                let phone = store.lock().await.get(&id).and_then(|c| c.phone.clone());
                message = Some(match phone {
                    Some(phone) => match open_call(app, &phone).await {
                        Ok(_) => format!("Calling {}", phone),
                        Err(e) => format!("Error: {}", e),
                    },
                    None => "No phone number.".to_string(),
                });
            }
            KeyCode::Char('n') => {
                println!();
                let current = store.lock().await.get(&id).map(|c| c.notes.clone()).unwrap_or_default();
                if let Some(text) = tokio::task::block_in_place(|| text_input("notes: ", Some(&current)))? {
                    if text != current {
                        notes.edit(&id, text).await;
                    }
                }
            }
            KeyCode::Char('e') => {
                println!();
                message = edit_field(&store, &id).await?;
            }
            KeyCode::Char('?') => {
                clear_screen()?;
                println!("{}", HELP);
                println!("Press any key to return...");
                tokio::task::block_in_place(read_key)?;
            }
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => {}
        }
    }

    if let Some(handle) = pending {
        handle.abort();
    }
    if let Some(report) = notes.flush().await {
        report_save(&report);
    }
    clear_screen()?;
    let reached = session.lock().await.progress();
    println!("Stopped at lead {} of {}.", reached.0, reached.1);
    Ok(())
}

enum KeyOrAdvance {
    Key(KeyCode, JoinHandle<bool>),
    Advanced(bool),
}

/// Wait for either a key press or the scheduled advance to fire.
async fn wait_for_key_or_advance(handle: JoinHandle<bool>) -> Result<KeyOrAdvance> {
    loop {
        if handle.is_finished() {
            return Ok(KeyOrAdvance::Advanced(handle.await.unwrap_or(false)));
        }
        if let Some(key) = tokio::task::block_in_place(|| poll_key(KEY_POLL))? {
            return Ok(KeyOrAdvance::Key(key, handle));
        }
    }
}

async fn save_position(store: &SharedStore, session: &SharedSession) {
    let index = session.lock().await.index();
    let report = store
        .lock()
        .await
        .set_setting(SettingKey::DialerPosition, index as i64)
        .await;
    if !report.is_saved() {
        report_save(&report);
    }
}

/// Flush notes, move the cursor, and remember the new position.
async fn navigate(
    store: &SharedStore,
    session: &SharedSession,
    notes: &mut NoteDebouncer,
    step: impl FnOnce(&mut DialerSession) -> bool,
) {
    notes.flush().await;
    let moved = step(&mut *session.lock().await);
    if moved {
        save_position(store, session).await;
    }
}

async fn edit_field(store: &SharedStore, id: &str) -> Result<Option<String>> {
    let labels: Vec<&str> = EditableField::all().iter().map(|f| f.as_str()).collect();
    let Some(choice) = tokio::task::block_in_place(|| select("field:", &labels))? else {
        return Ok(None);
    };
    let field = EditableField::all()[choice];

    let current = store
        .lock()
        .await
        .get(id)
        .and_then(|c| c.field(field))
        .map(str::to_string);
    let value = match tokio::task::block_in_place(|| prompt_field(field.as_str(), current.as_deref()))? {
        FormResult::Value(v) => v,
        FormResult::Cancelled => return Ok(Some("Cancelled.".to_string())),
    };

    if let Some(report) = store.lock().await.update_field(id, field, &value).await {
        report_save(&report);
    }
    Ok(Some("Saved.".to_string()))
}
