//! Conversions between the basic value notation of RFC 5545 and the
//! extended notation used by jCal and xCal.
//!
//! Values that do not have the expected shape pass through unchanged so
//! that lenient input survives a round trip.

use super::ValueType;

/// Recurrence rule parts whose values are integers.
const NUMERIC_RECUR_PARTS: [&str; 10] = [
    "count",
    "interval",
    "bysecond",
    "byminute",
    "byhour",
    "bymonthday",
    "byyearday",
    "byweekno",
    "bymonth",
    "bysetpos",
];

/// Converts a basic-notation value to extended notation.
#[must_use]
pub fn to_extended(value_type: ValueType, value: &str) -> String {
    match value_type {
        ValueType::Date => date_to_extended(value),
        ValueType::DateTime => date_time_to_extended(value),
        ValueType::Time => time_to_extended(value),
        ValueType::UtcOffset => offset_to_extended(value),
        ValueType::Period => map_period(value, date_time_to_extended),
        _ => value.to_string(),
    }
}

/// Converts an extended-notation value to basic notation.
#[must_use]
pub fn to_basic(value_type: ValueType, value: &str) -> String {
    match value_type {
        ValueType::Date | ValueType::DateTime | ValueType::Time | ValueType::UtcOffset => {
            strip_separators(value)
        }
        ValueType::Period => map_period(value, strip_separators),
        _ => value.to_string(),
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn date_to_extended(value: &str) -> String {
    if value.len() == 8 && all_digits(value) {
        format!("{}-{}-{}", &value[0..4], &value[4..6], &value[6..8])
    } else {
        value.to_string()
    }
}

fn time_to_extended(value: &str) -> String {
    let (time, utc) = match value.strip_suffix('Z') {
        Some(stripped) => (stripped, "Z"),
        None => (value, ""),
    };
    if time.len() == 6 && all_digits(time) {
        format!("{}:{}:{}{utc}", &time[0..2], &time[2..4], &time[4..6])
    } else {
        value.to_string()
    }
}

fn date_time_to_extended(value: &str) -> String {
    match value.split_once('T') {
        Some((date, time)) => format!("{}T{}", date_to_extended(date), time_to_extended(time)),
        None => date_to_extended(value),
    }
}

fn offset_to_extended(value: &str) -> String {
    let Some(sign) = value.chars().next().filter(|c| matches!(c, '+' | '-')) else {
        return value.to_string();
    };
    let digits = &value[1..];
    if !all_digits(digits) {
        return value.to_string();
    }
    match digits.len() {
        4 => format!("{sign}{}:{}", &digits[0..2], &digits[2..4]),
        6 => format!("{sign}{}:{}:{}", &digits[0..2], &digits[2..4], &digits[4..6]),
        _ => value.to_string(),
    }
}

/// Removes `-` and `:` from the date and time portions, keeping a leading sign.
fn strip_separators(value: &str) -> String {
    let (sign, rest) = match value.strip_prefix(['+', '-']) {
        Some(rest) => (&value[..1], rest),
        None => ("", value),
    };
    let mut out = String::with_capacity(value.len());
    out.push_str(sign);
    out.extend(rest.chars().filter(|c| !matches!(c, '-' | ':')));
    out
}

/// Applies `convert` to both ends of a period, leaving a duration end untouched.
fn map_period(value: &str, convert: fn(&str) -> String) -> String {
    match value.split_once('/') {
        Some((start, end)) => {
            let end = if end.starts_with(['P', '+', '-']) {
                end.to_string()
            } else {
                convert(end)
            };
            format!("{}/{end}", convert(start))
        }
        None => convert(value),
    }
}

/// Returns the value type of an `UNTIL` recurrence part.
#[must_use]
pub fn until_type(value: &str) -> ValueType {
    if value.contains('T') {
        ValueType::DateTime
    } else {
        ValueType::Date
    }
}

/// Returns whether a recurrence rule part holds integer values.
#[must_use]
pub fn is_numeric_recur_part(key: &str) -> bool {
    NUMERIC_RECUR_PARTS
        .iter()
        .any(|part| part.eq_ignore_ascii_case(key))
}

/// ## Summary
/// Splits a recurrence rule into `(lowercase key, value)` parts, in order.
///
/// List values (`BYDAY=MO,TU`) stay comma-joined.
#[must_use]
pub fn parse_recur(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (key.to_ascii_lowercase(), value.to_string()),
            None => (part.to_ascii_lowercase(), String::new()),
        })
        .collect()
}

/// Joins recurrence rule parts back into `KEY=VALUE;...` form.
#[must_use]
pub fn format_recur(parts: &[(String, String)]) -> String {
    parts
        .iter()
        .map(|(key, value)| format!("{}={value}", key.to_ascii_uppercase()))
        .collect::<Vec<_>>()
        .join(";")
}
