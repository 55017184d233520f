use once_cell::sync::Lazy;
use regex::Regex;
use crate::models::CellValue;

// Only the first alternative is anchored; the slash and dash forms may appear
// anywhere in the value.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{2}/[0-9]{2}/[0-9]{4}|[0-9]{2}-[0-9]{2}-[0-9]{4}")
        .expect("date pattern is valid")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const BOOLEAN_TOKENS: [&str; 6] = ["true", "false", "yes", "no", "1", "0"];

pub fn is_date_string(s: &str) -> bool {
    DATE_PATTERN.is_match(s)
}

pub fn is_email(s: &str) -> bool {
    EMAIL_PATTERN.is_match(s)
}

pub fn is_boolean_token(s: &str) -> bool {
    let lower = s.to_lowercase();
    BOOLEAN_TOKENS.contains(&lower.as_str())
}

/// Whether a string reads as a number under spreadsheet-style numeric
/// coercion: surrounding whitespace is ignored, a blank string counts as
/// zero, `0x`/`0o`/`0b` integer literals and `Infinity` are accepted.
pub fn parses_as_number(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return true;
    }

    let radix_literal = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|digits| (digits, *radix)));
    if let Some((digits, radix)) = radix_literal {
        return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    }

    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned.len() + 1 < trimmed.len() {
        // more than one sign
        return false;
    }
    if unsigned == "Infinity" {
        return true;
    }

    // Rust also accepts "inf" and "nan"; keep to plain decimal notation
    unsigned.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && trimmed.parse::<f64>().is_ok()
}

/// Non-missing values of a column, in row order.
pub fn present_values(values: &[CellValue]) -> Vec<&CellValue> {
    values.iter().filter(|v| !v.is_missing()).collect()
}

pub fn default_column_name(index: usize) -> String {
    format!("Column_{}", index + 1)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_patterns() {
        assert!(is_date_string("2024-01-31"));
        assert!(is_date_string("2024-01-31T10:00:00"));
        assert!(is_date_string("01/31/2024"));
        assert!(is_date_string("01-31-2024"));
        assert!(is_date_string("due 01/31/2024"));
        assert!(!is_date_string("31.01.2024"));
        assert!(!is_date_string("2024/01/31"));
        assert!(!is_date_string("hello"));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_email("a@b.co"));
        assert!(is_email("first.last@example.org"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a b@c.de"));
        assert!(!is_email("@c.de"));
    }

    #[test]
    fn test_boolean_tokens_case_insensitive() {
        for token in ["TRUE", "False", "yes", "NO", "1", "0"] {
            assert!(is_boolean_token(token), "{}", token);
        }
        assert!(!is_boolean_token("y"));
        assert!(!is_boolean_token("2"));
    }

    #[test]
    fn test_numeric_coercion() {
        for s in ["1", "-2.5", " 3 ", "1e3", ".5", "5.", "0x1A", "Infinity", "-Infinity", "  "] {
            assert!(parses_as_number(s), "{:?}", s);
        }
        for s in ["abc", "1,000", "inf", "NaN", "--1", "0x", "1.2.3", "12px"] {
            assert!(!parses_as_number(s), "{:?}", s);
        }
    }

    #[test]
    fn test_helpers() {
        assert_eq!(default_column_name(0), "Column_1");
        assert_eq!(round2(33.33333), 33.33);
        assert_eq!(round2(66.666), 66.67);
    }
}
