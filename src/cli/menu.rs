//! Main menu for coldcall
//!
//! Uses inquire for clean, reliable terminal interaction.

use anyhow::{anyhow, Result};
use inquire::{Select, Text};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use crate::app::App;
use crate::cli::dial::run_dial_at;
use crate::cli::list::run_interactive_list;
use crate::cli::ui::{clear_screen, minimal_render_config, select};
use crate::cli::{run_export, run_info, run_load, run_reparse, run_restore, run_save, run_show, run_upload};
use crate::models::{CompanyFilter, Disposition, StatusFilter};

/// Menu options with type-safe variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Dial,
    List,
    Show,
    Upload,
    Export,
    Restore,
    Save,
    Load,
    Reparse,
    Info,
    Quit,
}

impl MenuOption {
    const ALL: &'static [MenuOption] = &[
        MenuOption::Dial,
        MenuOption::List,
        MenuOption::Show,
        MenuOption::Upload,
        MenuOption::Export,
        MenuOption::Restore,
        MenuOption::Save,
        MenuOption::Load,
        MenuOption::Reparse,
        MenuOption::Info,
        MenuOption::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuOption::Dial => "Dial",
            MenuOption::List => "List",
            MenuOption::Show => "Show",
            MenuOption::Upload => "Upload",
            MenuOption::Export => "Export Backup",
            MenuOption::Restore => "Restore Backup",
            MenuOption::Save => "Save to File",
            MenuOption::Load => "Load from File",
            MenuOption::Reparse => "Re-parse Addresses",
            MenuOption::Info => "Storage Info",
            MenuOption::Quit => "Quit",
        }
    }

    fn from_label(s: &str) -> Option<MenuOption> {
        MenuOption::ALL.iter().find(|opt| opt.label() == s).copied()
    }
}

/// Run the interactive main menu
pub async fn run_menu(app: &mut App) -> Result<()> {
    if !io::stdin().is_terminal() {
        return Err(anyhow!(
            "Interactive menu requires a terminal. Use subcommands for non-interactive use:\n  \
            coldcall upload <file>\n  \
            coldcall list --all\n  \
            coldcall show <name>\n  \
            Run 'coldcall --help' for all options."
        ));
    }

    let menu_labels: Vec<&str> = MenuOption::ALL.iter().map(|opt| opt.label()).collect();

    loop {
        let _ = clear_screen();

        let selection = tokio::task::block_in_place(|| {
            Select::new("coldcall", menu_labels.clone())
                .with_render_config(minimal_render_config())
                .with_page_size(menu_labels.len())
                .with_vim_mode(true)
                .prompt_skippable()
        });

        let selection = match selection {
            Ok(sel) => sel,
            Err(_) => return Ok(()),
        };

        let Some(choice_label) = selection else {
            return Ok(());
        };

        let Some(choice) = MenuOption::from_label(choice_label) else {
            continue;
        };

        if choice == MenuOption::Quit {
            return Ok(());
        }

        let _ = clear_screen();

        if let Err(e) = execute_command(app, choice).await {
            eprintln!("\nError: {}", e);
        }
        wait_for_continue();
    }
}

async fn execute_command(app: &mut App, choice: MenuOption) -> Result<()> {
    match choice {
        MenuOption::Dial => match prompt_for_filter(app).await? {
            Some(filter) => run_dial_at(app, &filter, None).await,
            None => Ok(()),
        },
        MenuOption::List => match prompt_for_filter(app).await? {
            Some(filter) => run_interactive_list(app, filter).await,
            None => Ok(()),
        },
        MenuOption::Show => {
            let name = prompt_for_input("name: ")?;
            if name.is_empty() {
                return Ok(());
            }
            run_show(app, &name).await
        }
        MenuOption::Upload => run_upload(app, None).await,
        MenuOption::Export => run_export(app, None).await,
        MenuOption::Restore => {
            let path = prompt_for_input("backup file: ")?;
            if path.is_empty() {
                return Ok(());
            }
            run_restore(app, &PathBuf::from(path), true).await
        }
        MenuOption::Save => run_save(app).await,
        MenuOption::Load => run_load(app).await,
        MenuOption::Reparse => run_reparse(app).await,
        MenuOption::Info => run_info(app).await,
        MenuOption::Quit => Ok(()),
    }
}

/// Labels for the status picker, in the order of `status_filter_at`.
fn status_choices() -> Vec<String> {
    let mut choices = vec!["All".to_string(), "Not Called".to_string()];
    choices.extend(Disposition::all().iter().map(|d| d.label().to_string()));
    choices
}

fn status_filter_at(index: usize) -> StatusFilter {
    match index {
        0 => StatusFilter::All,
        1 => StatusFilter::NotCalled,
        n => Disposition::all()
            .get(n - 2)
            .map_or(StatusFilter::All, |d| StatusFilter::Is(*d)),
    }
}

/// Ask for status, city and state. `None` when the user backs out.
async fn prompt_for_filter(app: &App) -> Result<Option<CompanyFilter>> {
    let (cities, states) = {
        let store = app.store();
        let store = store.lock().await;
        (store.cities(), store.states())
    };

    let Some(status) = tokio::task::block_in_place(|| select("status:", &status_choices()))? else {
        return Ok(None);
    };
    let city = pick_optional("city:", cities)?;
    let state = pick_optional("state:", states)?;

    Ok(Some(CompanyFilter {
        status: status_filter_at(status),
        city,
        state,
    }))
}

/// Pick one of `values`, or "Any". Skipped when there is nothing to choose.
fn pick_optional(prompt: &str, values: Vec<String>) -> Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    let mut options = vec!["Any".to_string()];
    options.extend(values);
    let choice = tokio::task::block_in_place(|| select(prompt, &options))?;
    Ok(choice.filter(|&i| i > 0).map(|i| options[i].clone()))
}

/// Prompt for text input, returning empty string on cancel
fn prompt_for_input(label: &str) -> Result<String> {
    let result = tokio::task::block_in_place(|| {
        Text::new(label)
            .with_render_config(minimal_render_config())
            .prompt_skippable()
    })?;
    Ok(result.unwrap_or_default().trim().to_string())
}

/// Wait for user to press enter to continue
fn wait_for_continue() {
    println!();
    let _ = tokio::task::block_in_place(|| {
        Text::new("[enter]")
            .with_render_config(minimal_render_config())
            .prompt_skippable()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_option_roundtrip() {
        for opt in MenuOption::ALL {
            let label = opt.label();
            let recovered = MenuOption::from_label(label);
            assert_eq!(recovered, Some(*opt), "Failed roundtrip for {:?}", opt);
        }
    }

    #[test]
    fn test_menu_option_from_invalid_label() {
        assert_eq!(MenuOption::from_label("Invalid"), None);
        assert_eq!(MenuOption::from_label(""), None);
    }

    #[test]
    fn test_menu_option_all_has_correct_count() {
        assert_eq!(MenuOption::ALL.len(), 11);
    }

    #[test]
    fn test_status_choices_line_up_with_filters() {
        let choices = status_choices();
        assert_eq!(choices.len(), 8);
        assert_eq!(status_filter_at(0), StatusFilter::All);
        assert_eq!(status_filter_at(1), StatusFilter::NotCalled);
        for (i, label) in choices.iter().enumerate().skip(2) {
            let StatusFilter::Is(d) = status_filter_at(i) else {
                panic!("expected a disposition at {}", i);
            };
            assert_eq!(d.label(), label);
        }
    }
}
