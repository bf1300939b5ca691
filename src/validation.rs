//! Form validation shared by the HTTP handlers and the client layer.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("valid phone regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Spaces, dashes and parentheses are ignored; what remains must be an optional `+`
/// followed by 10 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&compact)
}

pub fn require_email(email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::BadRequest(
            "Please enter a valid email address.".into(),
        ));
    }
    Ok(())
}

pub fn require_password(password: &str) -> AppResult<()> {
    if !is_valid_password(password) {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

pub fn require_phone(phone: &str) -> AppResult<()> {
    if !is_valid_phone(phone) {
        return Err(AppError::BadRequest(
            "Please enter a valid phone number.".into(),
        ));
    }
    Ok(())
}

pub fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("meera@kalaghar.in"));
        assert!(is_valid_email("  a@b.co "));
        assert!(!is_valid_email("meera@kalaghar"));
        assert!(!is_valid_email("meera kalaghar@x.in"));
        assert!(!is_valid_email("@x.in"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn password_length() {
        assert!(is_valid_password("secret"));
        assert!(!is_valid_password("short"));
        assert!(require_password("12345").is_err());
    }

    #[test]
    fn phone_pattern() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+91 98765-43210"));
        assert!(is_valid_phone("(022) 2345 6789"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765abc10"));
        assert!(!is_valid_phone("+"));
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        assert!(require_non_empty("address", "   ").is_err());
        assert!(require_non_empty("address", "12 MG Road").is_ok());
    }
}
