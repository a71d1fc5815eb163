/// Input validators
///
/// Length limits and format checks for registration and note payloads.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_LOCAL_PART_LENGTH: usize = 64;
pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_CONTENT_LENGTH: usize = 100_000;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address for registration.
///
/// Surrounding whitespace is trimmed; case is preserved, so `A@x.com` and
/// `a@x.com` are different accounts.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    let local_part = trimmed.split('@').next().unwrap_or_default();
    if local_part.len() > MAX_LOCAL_PART_LENGTH {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Title of a note: required, not blank
pub fn is_valid_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("title".to_string()));
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong("title".to_string(), MAX_TITLE_LENGTH));
    }

    if trimmed.contains('\0') {
        return Err(ValidationError::InvalidFormat("title".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Body of a note: may be empty, stored as given
pub fn is_valid_content(content: &str) -> Result<String, ValidationError> {
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ValidationError::TooLong("content".to_string(), MAX_CONTENT_LENGTH));
    }

    if content.contains('\0') {
        return Err(ValidationError::InvalidFormat("content".to_string()));
    }

    Ok(content.to_string())
}
