/// Password Hashing and Verification
///
/// bcrypt with a configurable cost. The output is self-describing
/// (`$2b$<cost>$<salt><hash>`), so no salt is stored separately.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

/// bcrypt ignores input past 72 bytes; longer passwords are rejected
/// instead of silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password
    ///
    /// # Errors
    /// - `Validation` if the password is empty or too long
    /// - `Internal` if bcrypt fails; there is no weaker fallback
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        validate_password_input(password)?;

        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check a password against a stored hash, in constant time.
    ///
    /// Returns `Ok(false)` for a wrong password, including any password
    /// longer than `MAX_PASSWORD_BYTES`: bcrypt would compare only its
    /// first 72 bytes.
    ///
    /// # Errors
    /// Returns `Internal` if the stored hash cannot be parsed at all.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        verify(password, stored_hash).map_err(|e| {
            tracing::error!(error = %e, "Stored password hash is corrupt");
            AppError::Internal("Stored password hash is corrupt".to_string())
        })
    }
}

fn validate_password_input(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "password".to_string(),
        )));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_BYTES,
        )));
    }

    Ok(())
}
