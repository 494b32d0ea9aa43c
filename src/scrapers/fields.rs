//! Cleaning helpers that turn scraped text into the plain values the core expects.

use crate::models::DATE_FORMAT;
use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e:?}"))
}

/// Text of the first element matching `selector` under `element`, whitespace collapsed
pub(crate) fn text_of(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip currency symbols, thousands separators and unit suffixes ("£1,250 pcm" -> "1250").
/// Returns `None` when no digits remain.
pub fn clean_price(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.chars().any(|c| c.is_ascii_digit()) {
        Some(cleaned)
    } else {
        None
    }
}

/// Resolve "Added today"/"Reduced yesterday"/"Added on 05/06/2024" into `DD/MM/YYYY`
pub fn resolve_added_date(text: &str, today: NaiveDate) -> String {
    let text = collapse_whitespace(text);
    let lower = text.to_lowercase();
    if lower.contains("yesterday") {
        return (today - Duration::days(1)).format(DATE_FORMAT).to_string();
    }
    if lower.contains("today") {
        return today.format(DATE_FORMAT).to_string();
    }

    ["Added on ", "Reduced on ", "Added ", "Reduced "]
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .unwrap_or(&text)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_lose_symbols_and_suffixes() {
        assert_eq!(clean_price("£1,250 pcm").as_deref(), Some("1250"));
        assert_eq!(clean_price("£288 pw").as_deref(), Some("288"));
        assert_eq!(clean_price("£199.50pppw").as_deref(), Some("199.50"));
        assert_eq!(clean_price("POA"), None);
        assert_eq!(clean_price(""), None);
    }

    #[test]
    fn relative_dates_are_resolved() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        assert_eq!(resolve_added_date("Added today", today), "01/03/2024");
        assert_eq!(resolve_added_date("Reduced yesterday", today), "29/02/2024");
        assert_eq!(resolve_added_date("\n  Added on 05/06/2024 \n", today), "05/06/2024");
        assert_eq!(resolve_added_date("Reduced on 15/01/2024", today), "15/01/2024");
    }
}
