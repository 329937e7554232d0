//! Field-level validation helpers shared by the request models.

use crate::errors::FieldError;

/// Accumulates every failed constraint instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() { Ok(()) } else { Err(self.0) }
    }
}

pub fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Polish postal code: `NN-NNN`
pub fn is_postal_code(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 6
        && bytes[2] == b'-'
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

/// E.164-like phone number: optional `+`, a non-zero digit, then 1 to 14 digits.
pub fn is_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    (2..=15).contains(&digits.len())
        && !digits.starts_with('0')
        && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

pub fn is_country_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_alphabetic())
}

pub fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("80-831", true)]
    #[case("00-000", true)]
    #[case("80831", false)]
    #[case("8-0831", false)]
    #[case("80-83a", false)]
    fn test_postal_code(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_postal_code(value), expected);
    }

    #[rstest]
    #[case("+48123456789", true)]
    #[case("48123456789", true)]
    #[case("+0123", false)]
    #[case("+4", false)]
    #[case("+48 123 456", false)]
    #[case("+1234567890123456", false)]
    fn test_phone(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_phone(value), expected);
    }

    #[rstest]
    #[case("kontakt@kowalski-law.pl", true)]
    #[case("kontakt@localhost", false)]
    #[case("@kowalski-law.pl", false)]
    #[case("a b@kowalski-law.pl", false)]
    #[case("a@b@c.pl", false)]
    fn test_email(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_email(value), expected);
    }

    #[test]
    fn test_url_and_country() {
        assert!(is_http_url("https://kowalski-law.pl"));
        assert!(!is_http_url("kowalski-law.pl"));
        assert!(!is_http_url("ftp://kowalski-law.pl"));
        assert!(is_country_code("PL"));
        assert!(!is_country_code("POL"));
    }

    #[test]
    fn test_field_errors_accumulate() {
        let mut errors = FieldErrors::new();
        errors.check(true, "name", "never recorded");
        errors.check(false, "tax_number", "tax_number must be exactly 10 digits");
        errors.push("address.city", "address.city must not be empty");

        let details = errors.into_result().unwrap_err();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "tax_number");
        assert_eq!(details[1].field, "address.city");
    }
}
