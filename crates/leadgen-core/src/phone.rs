//! Kenyan phone-number normalization and extraction.
//!
//! The directory service returns numbers in a mix of local (`07xx…`),
//! international (`+2547xx…`), spaced, and hyphenated forms. Everything is
//! normalized to `+254XXXXXXXXX` before a record leaves ingestion; numbers
//! that cannot be normalized to a valid Kenyan mobile number are dropped.

use regex::Regex;

/// Normalize a raw phone number to international `+254…` form.
///
/// Handles numbers already in international form (with or without `+`),
/// local numbers with a leading `0`, and bare 9-digit subscriber numbers.
/// Returns `None` for empty input; returns the input unchanged when no known
/// pattern matches (validation then rejects it).
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.starts_with("254") {
        Some(format!("+{digits}"))
    } else if let Some(rest) = digits.strip_prefix('0') {
        Some(format!("+254{rest}"))
    } else if digits.len() == 9 {
        Some(format!("+254{digits}"))
    } else if digits.len() == 10 && digits.starts_with('7') {
        Some(format!("+254{digits}"))
    } else {
        Some(raw.to_owned())
    }
}

/// Whether `raw` normalizes to a valid Kenyan mobile number.
///
/// Valid numbers are `+254` followed by `7`, `1`, or `0` and eight more
/// digits.
#[must_use]
pub fn is_valid(raw: &str) -> bool {
    let Some(formatted) = normalize(raw) else {
        return false;
    };
    let re = Regex::new(r"^\+254[710]\d{8}$").expect("valid phone regex");
    re.is_match(&formatted)
}

/// Extract all valid phone numbers from free text, normalized and
/// deduplicated in order of first appearance.
#[must_use]
pub fn extract(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let patterns = [
        r"\+254[710]\d{8}",
        r"0[710]\d{8}",
        r"\+254\s[710]\d{2}\s\d{3}\s\d{3}",
        r"0[710]\d{2}\s\d{3}\s\d{3}",
        r"\+254-[710]\d{2}-\d{3}-\d{3}",
        r"0[710]\d{2}-\d{3}-\d{3}",
    ];

    let mut found: Vec<String> = Vec::new();
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid phone extraction regex");
        for m in re.find_iter(text) {
            found.push(m.as_str().to_owned());
        }
    }

    let mut out: Vec<String> = Vec::new();
    for raw in found {
        if !is_valid(&raw) {
            continue;
        }
        if let Some(formatted) = normalize(&raw) {
            if !out.contains(&formatted) {
                out.push(formatted);
            }
        }
    }
    out
}

/// Strip the leading `+` for transports that address by bare digits
/// (the messaging bridge expects `2547XXXXXXXX`).
#[must_use]
pub fn bare_digits(raw: &str) -> Option<String> {
    let formatted = normalize(raw)?;
    if !is_valid(&formatted) {
        return None;
    }
    Some(formatted.trim_start_matches('+').to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_local_leading_zero() {
        assert_eq!(normalize("0712345678").as_deref(), Some("+254712345678"));
    }

    #[test]
    fn normalize_international_without_plus() {
        assert_eq!(normalize("254712345678").as_deref(), Some("+254712345678"));
    }

    #[test]
    fn normalize_already_international() {
        assert_eq!(normalize("+254712345678").as_deref(), Some("+254712345678"));
    }

    #[test]
    fn normalize_bare_nine_digits() {
        assert_eq!(normalize("712345678").as_deref(), Some("+254712345678"));
    }

    #[test]
    fn normalize_strips_spaces_and_hyphens() {
        assert_eq!(
            normalize("0712 345-678").as_deref(),
            Some("+254712345678")
        );
    }

    #[test]
    fn normalize_empty_is_none() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
    }

    #[test]
    fn is_valid_accepts_mobile_prefixes() {
        assert!(is_valid("0712345678"));
        assert!(is_valid("0112345678"));
        assert!(is_valid("+254712345678"));
    }

    #[test]
    fn is_valid_rejects_short_and_foreign() {
        assert!(!is_valid("12345"));
        assert!(!is_valid("+14155551234"));
        assert!(!is_valid("not a number"));
    }

    #[test]
    fn extract_finds_mixed_formats() {
        let text = "Call us on 0712 345 678 or +254-733-111-222 today";
        assert_eq!(
            extract(text),
            vec!["+254712345678".to_owned(), "+254733111222".to_owned()]
        );
    }

    #[test]
    fn extract_deduplicates_same_number_in_two_forms() {
        let text = "0712345678 / +254712345678";
        assert_eq!(extract(text), vec!["+254712345678".to_owned()]);
    }

    #[test]
    fn extract_empty_text() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn bare_digits_strips_plus() {
        assert_eq!(
            bare_digits("0712345678").as_deref(),
            Some("254712345678")
        );
    }

    #[test]
    fn bare_digits_rejects_invalid() {
        assert_eq!(bare_digits("12345"), None);
    }
}
