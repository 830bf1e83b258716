use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Field checks shared by registration and the admin account editor.
pub fn validate_credentials(username: &str, email: &str) -> Result<(), AppError> {
    if username.len() < 3 || username.len() > 80 {
        return Err(AppError::Validation(
            "Username must be between 3 and 80 characters".into(),
        ));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// True when a write bounced off a UNIQUE constraint. The schema is the
/// last line of defense against races, so this has to be distinguishable
/// from other database failures at the handler boundary.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn username_length_is_bounded() {
        assert!(validate_credentials("ab", "a@b.com").is_err());
        assert!(validate_credentials("abc", "a@b.com").is_ok());
        assert!(validate_credentials(&"x".repeat(81), "a@b.com").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }
}
