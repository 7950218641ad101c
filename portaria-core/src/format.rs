//! Formatting and parsing helpers for identifiers, phone numbers and
//! timestamps.
//!
//! Identifiers (CPF) and phone numbers are stored as bare digit strings and
//! masked only for display and for the spreadsheet. Timestamps use the pt-BR
//! convention (`dd/mm/yyyy, HH:MM:SS`), which is also the persisted format.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Length of a complete CPF in digits.
pub const CPF_DIGITS: usize = 11;

/// Minimum number of digits for a phone number to be accepted.
pub const PHONE_MIN_DIGITS: usize = 10;

const BR_DATETIME: &str = "%d/%m/%Y, %H:%M:%S";
const BR_SHORT: &str = "%d/%m, %H:%M";

/// ISO-like layouts the spreadsheet may hand back instead of pt-BR strings.
const ISO_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Strips everything but ASCII digits.
pub fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Masks a value as `000.000.000-00`.
///
/// Non-digits are discarded first, so formatting an already formatted value
/// returns it unchanged. Partial input is masked progressively and anything
/// past eleven digits is dropped.
pub fn format_cpf(value: &str) -> String {
    let d = digits(value);
    if d.len() <= 3 {
        return d;
    }

    let (first, rest) = d.split_at(3);
    if rest.len() < 4 {
        return format!("{}.{}", first, rest);
    }

    let (second, rest) = rest.split_at(3);
    if rest.len() < 4 {
        return format!("{}.{}.{}", first, second, rest);
    }

    let (third, check) = rest.split_at(3);
    format!(
        "{}.{}.{}-{}",
        first,
        second,
        third,
        &check[..check.len().min(2)]
    )
}

/// Masks a value as `(00) 00000-0000`.
///
/// Ten-digit landlines come out as `(00) 00000-000`; the mask is tuned for
/// mobile numbers and only the digits matter for storage.
pub fn format_phone(value: &str) -> String {
    let d = digits(value);
    if d.len() < 3 {
        return d;
    }

    let (area, rest) = d.split_at(2);
    if rest.len() < 6 {
        return format!("({}) {}", area, rest);
    }

    let (prefix, line) = rest.split_at(5);
    format!("({}) {}-{}", area, prefix, &line[..line.len().min(4)])
}

/// Renders a spreadsheet cell as text.
///
/// Missing, null, `false` and zero cells are treated as empty, matching how
/// the sheet leaves blank cells.
pub fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => {
            if n.as_f64() == Some(0.0) {
                String::new()
            } else {
                number_text(n)
            }
        }
        Some(other) => other.to_string(),
    }
}

/// Extracts the digits of a spreadsheet cell.
///
/// Spreadsheets like to turn long digit strings into numbers, and sometimes
/// into scientific notation (`1.2345678901E+10`). Both are expanded back into
/// plain digits before stripping. A zero cell counts as empty, as in
/// [`cell_text`].
pub fn cell_digits(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Number(n)) => digits(&number_text(n)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            let lower = trimmed.to_lowercase();
            if lower.contains("e+") || lower.contains("e-") {
                if let Ok(n) = trimmed.parse::<f64>() {
                    return digits(&float_text(n));
                }
            }
            digits(trimmed)
        }
        other => digits(&cell_text(other)),
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_u64() {
        return i.to_string();
    }
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    n.as_f64().map(float_text).unwrap_or_default()
}

fn float_text(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Formats a timestamp in the persisted pt-BR layout.
pub fn format_br_datetime(at: &NaiveDateTime) -> String {
    at.format(BR_DATETIME).to_string()
}

/// Current local time in the persisted pt-BR layout.
pub fn now_br() -> String {
    format_br_datetime(&Local::now().naive_local())
}

/// Parses a persisted timestamp.
///
/// Accepts the pt-BR layout (with or without the comma, seconds optional)
/// and the ISO-like layouts the spreadsheet may return.
pub fn parse_br_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.contains('-') && !value.contains('/') {
        return parse_iso(value);
    }

    let normalized = value.replacen(',', "", 1);
    let mut parts = normalized.split_whitespace();
    let date = parts.next()?;
    let time = parts.next().unwrap_or("00:00:00");

    let mut date_parts = date.split('/').map(|p| p.parse::<u32>().ok());
    let day = date_parts.next()??;
    let month = date_parts.next()??;
    let year = date_parts.next()?? as i32;

    let mut time_parts = time.split(':').map(|p| p.parse::<u32>().unwrap_or(0));
    let hour = time_parts.next().unwrap_or(0);
    let minute = time_parts.next().unwrap_or(0);
    let second = time_parts.next().unwrap_or(0);

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    for layout in ISO_LAYOUTS {
        if let Ok(at) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(at);
        }
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Local).naive_local());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Short `dd/mm, HH:MM` rendering for listings.
///
/// Empty values render as `--`; values that cannot be parsed are shown as is.
pub fn format_short(value: &str) -> String {
    if value.trim().is_empty() {
        return "--".to_string();
    }
    match parse_br_datetime(value) {
        Some(at) => at.format(BR_SHORT).to_string(),
        None => value.to_string(),
    }
}
