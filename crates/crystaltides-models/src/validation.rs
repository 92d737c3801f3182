use std::borrow::Cow;

use validator::{ValidateUrl, ValidationError};

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Rejects strings that are empty after trimming.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "must not be blank"));
    }
    Ok(())
}

/// Accepts an http(s) URL or an empty string (clears the field).
pub fn url_or_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || (value.validate_url() && value.starts_with("http")) {
        return Ok(());
    }
    Err(error("url", "must be a valid URL"))
}

/// Lower-case letters, digits and single dashes.
pub fn valid_slug(value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(error("slug", "must be a lower-case slug"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_or_empty() {
        assert!(url_or_empty("").is_ok());
        assert!(url_or_empty("https://ko-fi.com/crystaltides").is_ok());
        assert!(url_or_empty("ko-fi").is_err());
        assert!(url_or_empty("ftp://example.com").is_err());
    }

    #[test]
    fn test_valid_slug() {
        assert!(valid_slug("reglas-del-servidor").is_ok());
        assert!(valid_slug("Reglas").is_err());
        assert!(valid_slug("a--b").is_err());
        assert!(valid_slug("-a").is_err());
        assert!(valid_slug("").is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank(" x ").is_ok());
    }
}
