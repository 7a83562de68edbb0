//! Phone number and message normalization

use regex::Regex;
use std::sync::OnceLock;

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").unwrap())
}

fn angle_brackets() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[<>]").unwrap())
}

/// Maximum accepted message length after sanitization
const MAX_MESSAGE_LEN: usize = 500;

/// Validate and standardize a phone number to `+971...` form.
///
/// Accepts full international numbers (`971` + 9 digits), local numbers
/// with a leading zero, and bare 9-digit subscriber numbers. Anything
/// else is rejected.
pub fn normalize_phone(phone_number: &str) -> Option<String> {
    let cleaned = non_digits().replace_all(phone_number, "");

    if cleaned.starts_with("971") && cleaned.len() == 12 {
        Some(format!("+{}", cleaned))
    } else if cleaned.starts_with('0') && cleaned.len() == 10 {
        Some(format!("+971{}", &cleaned[1..]))
    } else if cleaned.len() == 9 {
        Some(format!("+971{}", cleaned))
    } else {
        None
    }
}

/// Clean up a user message: collapse whitespace, strip angle brackets,
/// cap the length.
pub fn sanitize_message(message: &str) -> String {
    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = angle_brackets().replace_all(&collapsed, "");

    cleaned.chars().take(MAX_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_international_number() {
        assert_eq!(
            normalize_phone("971501234567").as_deref(),
            Some("+971501234567")
        );
        assert_eq!(
            normalize_phone("whatsapp:+971501234567").as_deref(),
            Some("+971501234567")
        );
    }

    #[test]
    fn test_local_number_with_leading_zero() {
        assert_eq!(
            normalize_phone("0501234567").as_deref(),
            Some("+971501234567")
        );
    }

    #[test]
    fn test_bare_subscriber_number() {
        assert_eq!(
            normalize_phone("501234567").as_deref(),
            Some("+971501234567")
        );
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(normalize_phone("12345").is_none());
        assert!(normalize_phone("").is_none());
        assert!(normalize_phone("+14155238886").is_none());
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_message("  hello   world \n"), "hello world");
    }

    #[test]
    fn test_sanitize_strips_angle_brackets() {
        assert_eq!(sanitize_message("<script>hi</script>"), "scripthi/script");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(600);
        assert_eq!(sanitize_message(&long).len(), 500);
    }
}
