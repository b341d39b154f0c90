//! Shared UI primitives for coldcall
//!
//! Conventions:
//! - Prompts: lowercase with colon and space: `notes: `
//! - Navigation hints: arrows in brackets: `[←/→]`
//! - Feedback: single word when possible: `Saved.`

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    ExecutableCommand,
};
use inquire::{ui::RenderConfig, Confirm, InquireError, Select, Text};

use crate::models::Company;
use crate::storage::SaveReport;
use crate::store::RecordStore;

// ============================================================================
// Raw Mode
// ============================================================================

/// RAII guard that ensures raw mode is disabled on drop
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn key_code(event: Event) -> Option<KeyCode> {
    match event {
        Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind != KeyEventKind::Release => {
            // Ctrl+C behaves like quit
            if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                Some(KeyCode::Esc)
            } else {
                Some(code)
            }
        }
        _ => None,
    }
}

/// Block until a key is pressed.
pub fn read_key() -> Result<KeyCode> {
    let _guard = RawModeGuard::new()?;
    loop {
        if let Some(code) = key_code(event::read()?) {
            return Ok(code);
        }
    }
}

/// Wait up to `timeout` for a key press.
pub fn poll_key(timeout: Duration) -> Result<Option<KeyCode>> {
    let _guard = RawModeGuard::new()?;
    if event::poll(timeout)? {
        return Ok(key_code(event::read()?));
    }
    Ok(None)
}

// ============================================================================
// Layout Primitives
// ============================================================================

/// Truncate a string to max_chars, adding ellipsis if needed.
/// Result will be at most max_chars characters (including ellipsis if truncated).
pub fn truncate(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars - 1).collect();
    format!("{}…", kept)
}

/// Clear the terminal screen and move cursor to top-left
pub fn clear_screen() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(Clear(ClearType::All))?;
    stdout.execute(cursor::MoveTo(0, 0))?;
    stdout.flush()?;
    Ok(())
}

/// Get terminal dimensions, defaulting to 80x24 if unavailable
pub fn term_size() -> (usize, usize) {
    crossterm::terminal::size()
        .map(|(w, h)| (w as usize, h as usize))
        .unwrap_or((80, 24))
}

/// Number of visible content lines for scrollable lists.
/// Accounts for header (2 lines) and status bar (2 lines).
pub fn visible_lines() -> usize {
    let (_, height) = term_size();
    height.saturating_sub(4).max(5)
}

// ============================================================================
// Message Functions
// ============================================================================

/// Print a warning message to stderr
#[inline]
pub fn warning(msg: &str) {
    eprintln!("Warning: {}", msg);
}

/// Tell the user where a write went when it did not land on the primary backend.
pub fn report_save(report: &SaveReport) {
    match report.saved_to {
        None => warning("changes could not be saved to any storage backend"),
        Some(kind) if report.fell_back() => {
            let failed: Vec<_> = report.failures.iter().map(|(k, _)| k.label()).collect();
            warning(&format!("{} unavailable, saved to {}", failed.join(", "), kind.label()));
        }
        Some(_) => {}
    }
}

// ============================================================================
// Prompts
// ============================================================================

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

/// Display a selection menu and return the chosen index
pub fn select<T: ToString>(prompt: &str, options: &[T]) -> Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }

    let items: Vec<String> = options.iter().map(|o| o.to_string()).collect();

    let result = Select::new(prompt, items.clone())
        .with_render_config(minimal_render_config())
        .with_page_size(visible_lines())
        .with_vim_mode(true)
        .prompt_skippable()?;

    Ok(result.and_then(|selected| items.iter().position(|o| *o == selected)))
}

/// Prompt for text input with optional default value
pub fn text_input(prompt: &str, default: Option<&str>) -> Result<Option<String>> {
    let mut builder = Text::new(prompt).with_render_config(minimal_render_config());

    if let Some(d) = default {
        if !d.is_empty() {
            builder = builder.with_initial_value(d);
        }
    }

    let result = builder.prompt_skippable()?;
    Ok(result)
}

/// Prompt for yes/no confirmation (default: no)
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(false)
        .prompt()?;
    Ok(result)
}

/// Result type for form inputs that can be cancelled
pub enum FormResult<T> {
    Value(T),
    Cancelled,
}

/// Prompt for a field with optional current value
/// Format: `field [current] (- clears): ` or `field: ` if no current value
/// Empty input keeps the current value.
pub fn prompt_field(field: &str, current: Option<&str>) -> Result<FormResult<String>> {
    let has_value = current.map(|v| !v.is_empty()).unwrap_or(false);
    let prompt = match current {
        Some(val) if !val.is_empty() => format!("{} [{}] (- clears): ", field, truncate(val, 30)),
        _ => format!("{}: ", field),
    };

    let result = Text::new(&prompt)
        .with_render_config(minimal_render_config())
        .prompt();

    match result {
        Ok(input) => {
            let input = input.trim();
            if input == "-" && has_value {
                Ok(FormResult::Value(String::new()))
            } else if input.is_empty() {
                Ok(FormResult::Value(current.unwrap_or("").to_string()))
            } else {
                Ok(FormResult::Value(input.to_string()))
            }
        }
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
            Ok(FormResult::Cancelled)
        }
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Company Lookup
// ============================================================================

/// Companies whose id equals `identifier`, or whose title contains it.
pub fn match_companies<'a>(store: &'a RecordStore, identifier: &str) -> Vec<&'a Company> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Vec::new();
    }
    if let Some(company) = store.get(identifier) {
        return vec![company];
    }

    let needle = identifier.to_lowercase();
    store
        .companies()
        .iter()
        .filter(|c| c.display_title().to_lowercase().contains(&needle))
        .collect()
}

fn format_company_for_select(company: &Company) -> String {
    match company.location() {
        Some(loc) => format!("{} ({})  {}", company.display_title(), loc, company.id),
        None => format!("{}  {}", company.display_title(), company.id),
    }
}

/// Find a company id by id or title search, prompting when several match.
/// Returns None if not found or selection cancelled.
pub fn find_company_by_identifier(store: &RecordStore, identifier: &str) -> Result<Option<String>> {
    let matches = match_companies(store, identifier);
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0].id.clone())),
        _ => {
            let options: Vec<String> = matches.iter().map(|c| format_company_for_select(c)).collect();
            Ok(select("Select:", &options)?.map(|idx| matches[idx].id.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBackend;
    use crate::storage::{BackendChain, BackendKind};
    use std::sync::Arc;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[tokio::test]
    async fn test_match_companies() {
        let acme = Company::new("Acme Plumbing".to_string());
        let other = Company::new("Acme Roofing".to_string());
        let globex = Company::new("Globex".to_string());
        let backend = Arc::new(
            MemoryBackend::new(BackendKind::Sqlite)
                .with_companies(vec![acme.clone(), other, globex.clone()]),
        );
        let store = RecordStore::load(BackendChain::new(backend)).await;

        assert_eq!(match_companies(&store, &globex.id).len(), 1);
        assert_eq!(match_companies(&store, "acme").len(), 2);
        assert_eq!(match_companies(&store, "plumb")[0].id, acme.id);
        assert!(match_companies(&store, "  ").is_empty());
        assert!(match_companies(&store, "initech").is_empty());
    }
}
