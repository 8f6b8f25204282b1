use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub fn format_timestamp(instant: &DateTime<Utc>, format: &str) -> String {
    instant.format(format).to_string()
}

/// Parse a filename timestamp as UTC
pub fn parse_timestamp(value: &str, format: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(value, format)
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("'{}' does not match '{}': {}", value, format, e))
}

/// Checks that `format` renders every instant with the same width, sorts in
/// chronological order and parses back to the second. Returns the width.
pub fn fixed_width(format: &str) -> Result<usize, String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("'{}' is not a valid timestamp format", format));
    }

    let references = [
        reference(1999, 1, 2, 3, 4, 5),
        reference(2001, 10, 11, 12, 13, 14),
        reference(2099, 12, 31, 23, 59, 59),
        reference(2100, 1, 1, 0, 0, 0),
    ];
    let rendered: Vec<String> = references
        .iter()
        .map(|instant| format_timestamp(instant, format))
        .collect();

    let width = rendered[0].len();
    if width == 0 || rendered.iter().any(|r| r.len() != width) {
        return Err(format!("timestamp format '{}' is not fixed-width", format));
    }
    if rendered.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(format!(
            "timestamp format '{}' does not sort chronologically",
            format
        ));
    }
    for (instant, text) in references.iter().zip(&rendered) {
        if parse_timestamp(text, format).ok().as_ref() != Some(instant) {
            return Err(format!(
                "timestamp format '{}' does not round-trip to second precision",
                format
            ));
        }
    }

    Ok(width)
}

fn reference(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, min, sec))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_nineteen_wide() {
        assert_eq!(fixed_width(DEFAULT_TIMESTAMP_FORMAT), Ok(19));
    }

    #[test]
    fn test_format_is_zero_padded() {
        let instant = reference(2024, 1, 5, 9, 0, 0);
        assert_eq!(
            format_timestamp(&instant, DEFAULT_TIMESTAMP_FORMAT),
            "2024-01-05-09-00-00"
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let instant = reference(2023, 7, 14, 18, 42, 7);
        let text = format_timestamp(&instant, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(parse_timestamp(&text, DEFAULT_TIMESTAMP_FORMAT), Ok(instant));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("2024-13-01-00-00-00", DEFAULT_TIMESTAMP_FORMAT).is_err());
        assert!(parse_timestamp("not-a-timestamp-xx", DEFAULT_TIMESTAMP_FORMAT).is_err());
    }

    #[test]
    fn test_rejects_variable_width_formats() {
        assert!(fixed_width("%Y-%-m-%-d-%H-%M-%S").is_err());
    }

    #[test]
    fn test_rejects_unsortable_formats() {
        assert!(fixed_width("%d-%m-%Y-%H-%M-%S").is_err());
    }

    #[test]
    fn test_rejects_formats_without_seconds() {
        assert!(fixed_width("%Y-%m-%d-%H-%M").is_err());
    }

    #[test]
    fn test_rejects_invalid_specifiers() {
        assert!(fixed_width("%Y-%m-%").is_err());
    }
}
