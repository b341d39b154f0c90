use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use crossterm::event::KeyCode;

use crate::app::App;
use crate::cli::dial::run_dial_at;
use crate::cli::display::{print_company_row, print_table_header};
use crate::cli::ui::{clear_screen, read_key, visible_lines};
use crate::cli::ListArgs;
use crate::models::{Company, CompanyFilter};

const CSV_HEADERS: [&str; 12] = [
    "id",
    "title",
    "phone",
    "website",
    "email",
    "contact",
    "city",
    "state",
    "status",
    "notes",
    "rating",
    "reviews",
];

/// Write companies as CSV with a header row.
pub fn write_csv<W: Write>(companies: &[&Company], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;

    for company in companies {
        let rating = company.rating.map(|r| r.to_string()).unwrap_or_default();
        let reviews = company.total_ratings.map(|r| r.to_string()).unwrap_or_default();
        csv_writer.write_record([
            company.id.as_str(),
            company.display_title(),
            company.phone.as_deref().unwrap_or(""),
            company.website.as_deref().unwrap_or(""),
            company.email.as_deref().unwrap_or(""),
            company.contact_name.as_deref().unwrap_or(""),
            company.city.as_deref().unwrap_or(""),
            company.state.as_deref().unwrap_or(""),
            company.disposition.map(|d| d.as_str()).unwrap_or(""),
            company.notes.as_str(),
            rating.as_str(),
            reviews.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Execute the list command
pub async fn run_list(app: &App, args: &ListArgs) -> Result<()> {
    let filter = args.filter.to_filter()?;
    let store = app.store();
    let guard = store.lock().await;
    let companies = guard.filtered(&filter);

    if args.csv {
        return write_csv(&companies, io::stdout().lock());
    }

    if companies.is_empty() {
        if guard.is_empty() {
            println!("No companies. Import some with `coldcall upload <file>`.");
        } else {
            println!("No companies match.");
        }
        return Ok(());
    }

    // Use non-interactive mode if --all flag or not a TTY
    if args.all || !io::stdout().is_terminal() {
        println!("Companies ({} of {})\n", companies.len(), guard.len());
        print_table_header();
        for company in &companies {
            print_company_row(company, false);
        }
        return Ok(());
    }

    drop(companies);
    drop(guard);
    run_interactive_list(app, filter).await
}

/// Scrollable directory view; Enter opens the dialer at the selected lead.
pub async fn run_interactive_list(app: &App, filter: CompanyFilter) -> Result<()> {
    let mut cursor: usize = 0; // Absolute index in filtered list
    let mut scroll: usize = 0; // First visible row

    loop {
        let visible = visible_lines();
        let total = {
            let store = app.store();
            let store = store.lock().await;
            let companies = store.filtered(&filter);
            let total = companies.len();
            if total == 0 {
                return Ok(());
            }
            cursor = cursor.min(total - 1);

            // Adjust scroll to keep cursor visible
            if cursor < scroll {
                scroll = cursor;
            } else if cursor >= scroll + visible {
                scroll = cursor - visible + 1;
            }

            clear_screen()?;
            print_table_header();
            for (i, company) in companies.iter().enumerate().skip(scroll).take(visible) {
                print_company_row(company, i == cursor);
            }
            total
        };

        println!("\n{}/{}  [↑↓] move [enter] dial from here [esc] back", cursor + 1, total);

        let code = tokio::task::block_in_place(read_key)?;
        match code {
            KeyCode::Down | KeyCode::Char('j') => {
                if cursor + 1 < total {
                    cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                cursor = cursor.saturating_sub(1);
            }
            KeyCode::PageDown | KeyCode::Char(' ') | KeyCode::Right => {
                cursor = (cursor + visible).min(total - 1);
            }
            KeyCode::PageUp | KeyCode::Left => {
                cursor = cursor.saturating_sub(visible);
            }
            KeyCode::Home | KeyCode::Char('g') => {
                cursor = 0;
            }
            KeyCode::End | KeyCode::Char('G') => {
                cursor = total - 1;
            }
            KeyCode::Enter => {
                run_dial_at(app, &filter, Some(cursor)).await?;
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                break;
            }
            _ => {}
        }
    }

    clear_screen()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Disposition;

    #[test]
    fn test_write_csv() {
        let mut acme = Company::new("Acme, Inc.".to_string());
        acme.phone = Some("704-555-0100".to_string());
        acme.city = Some("Charlotte".to_string());
        acme.state = Some("NC".to_string());
        acme.disposition = Some(Disposition::CallBack);
        acme.notes = "ask for \"Sam\"".to_string();
        acme.rating = Some(4.5);
        acme.total_ratings = Some(20);

        let mut out = Vec::new();
        write_csv(&[&acme], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("id,title,phone,website,email,contact,city,state,status,notes,rating,reviews")
        );
        assert_eq!(
            lines.next().unwrap(),
            format!(
                "{},\"Acme, Inc.\",704-555-0100,,,,Charlotte,NC,call-back,\"ask for \"\"Sam\"\"\",4.5,20",
                acme.id
            )
        );
    }
}
