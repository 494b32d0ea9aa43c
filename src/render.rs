//! Plain-text table rendering for listings sent to a chat channel.

use crate::models::{Listing, DATE_FORMAT};

pub const COLUMNS: [&str; 6] = [
    "id",
    "date_added",
    "price_per_month",
    "price_per_week",
    "location",
    "link",
];

fn cells(listing: &Listing) -> [String; 6] {
    [
        listing.id().to_string(),
        listing.date_added().format(DATE_FORMAT).to_string(),
        listing.price_per_month().to_string(),
        listing
            .price_per_week()
            .map(|price| price.to_string())
            .unwrap_or_default(),
        listing.location().to_string(),
        listing.link().to_string(),
    ]
}

/// Render listings as a pipe table, one row per listing in the given order
pub fn table(listings: &[Listing]) -> String {
    let rows: Vec<[String; 6]> = listings.iter().map(cells).collect();

    let mut widths = COLUMNS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(COLUMNS.iter().copied(), &widths));
    lines.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| format!(":{}", "-".repeat(w + 1)))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in &rows {
        lines.push(line(row.iter().map(String::as_str), &widths));
    }

    lines.join("\n")
}

/// Table wrapped in a code fence so chat clients keep the columns aligned
pub fn fenced(listings: &[Listing]) -> String {
    format!("```\n{}\n```", table(listings))
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize; 6]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
        .collect();
    format!("|{}|", padded.join("|"))
}
