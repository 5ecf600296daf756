//! Utility functions for the goal tracker

use crate::constants::{DATA_DIR_NAME, DATE_FORMATS};
use chrono::{DateTime, NaiveDate, TimeZone};
use std::fmt::Display;
use std::path::PathBuf;

/// Get the default data directory (`$HOME/.goals`)
#[must_use]
pub fn get_default_data_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home).join(DATA_DIR_NAME)
}

/// Format a date for display
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a datetime for display, keeping its own offset
#[must_use]
pub fn format_datetime<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Parse a date string, trying each of the supported formats in order
///
/// # Errors
/// Returns the `chrono::ParseError` of the last format tried if none match
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    let mut last_err = None;
    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(date_str, format) {
            Ok(date) => return Ok(date),
            Err(e) => last_err = Some(e),
        }
    }
    // DATE_FORMATS is non-empty, so at least one error was recorded
    match last_err {
        Some(e) => Err(e),
        None => NaiveDate::parse_from_str(date_str, "%Y-%m-%d"),
    }
}

/// Truncate a string to a maximum number of characters
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Round a value to the given number of decimal places
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Render a fixed-width text progress bar such as `[#####.....]`
#[must_use]
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = (ratio * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}
