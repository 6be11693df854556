//! US phone number formatting.

use std::sync::LazyLock;

use regex::Regex;

const FORMATTED_MAX_LEN: usize = 14;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").expect("valid phone regex"));

/// Progressively formats user input towards `(XXX) XXX-XXXX`.
///
/// Partial input is formatted as far as it goes, so it can be applied on
/// every keystroke. Input with more than ten digits is only truncated.
pub fn format_phone_number(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return String::new();
    }
    if digits.len() > 10 {
        return value.chars().take(FORMATTED_MAX_LEN).collect();
    }

    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_progressively() {
        assert_eq!(format_phone_number(""), "");
        assert_eq!(format_phone_number("abc"), "");
        assert_eq!(format_phone_number("5"), "5");
        assert_eq!(format_phone_number("555"), "555");
        assert_eq!(format_phone_number("5551"), "(555) 1");
        assert_eq!(format_phone_number("555123"), "(555) 123");
        assert_eq!(format_phone_number("5551234"), "(555) 123-4");
        assert_eq!(format_phone_number("5551234567"), "(555) 123-4567");
    }

    #[test]
    fn ignores_punctuation_in_input() {
        assert_eq!(format_phone_number("555-123-4567"), "(555) 123-4567");
        assert_eq!(format_phone_number("(555) 123-4567"), "(555) 123-4567");
        assert_eq!(format_phone_number("555.123.4567"), "(555) 123-4567");
    }

    #[test]
    fn truncates_overlong_input() {
        assert_eq!(format_phone_number("(555) 123-45678"), "(555) 123-4567");
        assert_eq!(format_phone_number("123456789012345"), "12345678901234");
    }

    #[test]
    fn validates_final_form() {
        assert!(is_valid_phone_number("(555) 123-4567"));
        assert!(!is_valid_phone_number("555-123-4567"));
        assert!(!is_valid_phone_number("(555) 123-456"));
        assert!(!is_valid_phone_number("(555)123-4567"));
        assert!(!is_valid_phone_number(""));
    }
}
