//! Display and input formatting for operator-entered values

use crate::document::strip_non_digits;
use chrono::{Local, NaiveDateTime};

/// Storage format of `data_solicitacao`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in storage format
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `(DD) DDDDD-DDDD` for mobile numbers, `(DD) DDDD-DDDD` for landlines.
/// Other lengths are returned unchanged.
pub fn format_phone(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => raw.to_string(),
    }
}

/// `HH:MM` from the first four digits; shorter input is returned unchanged
pub fn format_time(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    if digits.len() < 4 {
        return raw.to_string();
    }
    format!("{}:{}", &digits[..2], &digits[2..4])
}

/// `DD/MM/YYYY` from the first eight digits; shorter input is returned unchanged
pub fn format_date(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    if digits.len() < 8 {
        return raw.to_string();
    }
    format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..8])
}

/// Render a stored timestamp as `DD/MM/YYYY`, or return it as-is if it does not parse
pub fn display_date(timestamp: &str) -> String {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("62999887766"), "(62) 99988-7766");
        assert_eq!(format_phone("6233445566"), "(62) 3344-5566");
        assert_eq!(format_phone("(62) 99988-7766"), "(62) 99988-7766");
        assert_eq!(format_phone("12345"), "12345");
    }

    #[test]
    fn test_format_time_and_date() {
        assert_eq!(format_time("0830"), "08:30");
        assert_eq!(format_time("8:3"), "8:3");
        assert_eq!(format_date("05032024"), "05/03/2024");
        assert_eq!(format_date("0503"), "0503");
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2024-03-05 14:22:01"), "05/03/2024");
        assert_eq!(display_date("not a date"), "not a date");
    }

    #[test]
    fn test_now_timestamp_parses() {
        let now = now_timestamp();
        assert!(NaiveDateTime::parse_from_str(&now, TIMESTAMP_FORMAT).is_ok());
    }
}
