use std::io;

use crossterm::{
    style::{Attribute, SetAttribute},
    ExecutableCommand,
};

use crate::cli::ui::{term_size, truncate};
use crate::models::{status_label, Company};

/// Strip the scheme and `www.`, then shorten to `max` characters.
pub fn truncate_url(url: &str, max: usize) -> String {
    let display = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    if display.chars().count() > max {
        let kept: String = display.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        display.to_string()
    }
}

/// Five-star bar for a rating, e.g. "★★★★☆".
pub fn rating_stars(rating: f64) -> String {
    let full = (rating.floor().clamp(0.0, 5.0)) as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

/// "Open" for operating businesses, the raw status otherwise.
pub fn business_status_label(status: &str) -> &str {
    if status == "OPERATIONAL" {
        "Open"
    } else {
        status
    }
}

/// Rating with review count, only when both are known.
pub fn rating_line(company: &Company) -> Option<String> {
    match (company.rating, company.total_ratings) {
        (Some(rating), Some(total)) => Some(format!(
            "{} {} ({} reviews)",
            rating_stars(rating),
            rating,
            total
        )),
        _ => None,
    }
}

/// Print a company with clean formatting (only non-empty fields)
pub fn print_company(company: &Company) {
    println!("{}\n", company.display_title());
    println!("  Status: {}", status_label(company.disposition));

    if let Some(line) = rating_line(company) {
        println!("  {}", line);
    }
    if let Some(status) = &company.business_status {
        println!("  {}", business_status_label(status));
    }

    if let Some(phone) = &company.phone {
        println!("  {}", phone);
    }
    if let Some(website) = &company.website {
        println!("  {}", truncate_url(website, 30));
    }
    if let Some(email) = &company.email {
        println!("  {}", email);
    }
    if let Some(contact) = &company.contact_name {
        println!("  {}", contact);
    }
    if let Some(location) = company.location() {
        println!("  {}", location);
    }
    if let Some(url) = &company.google_maps_url {
        println!("  {}", url);
    }

    if !company.notes.is_empty() {
        println!();
        for line in company.notes.lines() {
            println!("  {}", line);
        }
    }
}

/// Column layout based on terminal width
struct ColumnLayout {
    title_width: usize,
    phone_width: usize,
    show_website: bool,
}

impl ColumnLayout {
    fn for_width(width: usize) -> Self {
        if width >= 100 {
            ColumnLayout {
                title_width: 32,
                phone_width: 16,
                show_website: true,
            }
        } else {
            ColumnLayout {
                title_width: 28.min(width.saturating_sub(44)).max(10),
                phone_width: 16,
                show_website: false,
            }
        }
    }
}

pub fn print_table_header() {
    let layout = ColumnLayout::for_width(term_size().0);
    let mut line = format!(
        "{:<title_w$}  {:<phone_w$}  {:<20}  {:<14}",
        "COMPANY",
        "PHONE",
        "LOCATION",
        "STATUS",
        title_w = layout.title_width,
        phone_w = layout.phone_width
    );
    if layout.show_website {
        line.push_str("  WEBSITE");
    }
    println!("{}", line.trim_end());
}

pub fn print_company_row(company: &Company, selected: bool) {
    let layout = ColumnLayout::for_width(term_size().0);
    let mut line = format!(
        "{:<title_w$}  {:<phone_w$}  {:<20}  {:<14}",
        truncate(company.display_title(), layout.title_width),
        truncate(company.phone.as_deref().unwrap_or(""), layout.phone_width),
        truncate(&company.location().unwrap_or_default(), 20),
        status_label(company.disposition),
        title_w = layout.title_width,
        phone_w = layout.phone_width
    );
    if layout.show_website {
        if let Some(website) = &company.website {
            line.push_str("  ");
            line.push_str(&truncate_url(website, 25));
        }
    }
    let line = line.trim_end();

    if selected {
        let mut stdout = io::stdout();
        let _ = stdout.execute(SetAttribute(Attribute::Reverse));
        print!("{}", line);
        let _ = stdout.execute(SetAttribute(Attribute::Reset));
        println!();
    } else {
        println!("{}", line);
    }
}
