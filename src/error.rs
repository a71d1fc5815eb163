/// Error Handling Module
///
/// Domain error enums for each concern, a unified `AppError` used for
/// control flow, and the mapping from `AppError` onto HTTP responses.
///
/// The taxonomy callers observe is `ErrorKind`:
/// - `InvalidInput`: malformed or rejected payload
/// - `Unauthenticated`: missing/invalid/expired token or bad credentials
/// - `NotFound`: missing resource or resource owned by someone else
/// - `Conflict`: duplicate registration email
/// - `InternalFailure`: hashing, signing, store or configuration failures

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::response::ApiResponse;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooLong(String, usize),
    InvalidFormat(String),
    MalformedPayload(String),
    OwnershipChange,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {})", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::MalformedPayload(msg) => write!(f, "Invalid request: {}", msg),
            ValidationError::OwnershipChange => write!(f, "Note ownership cannot be changed"),
        }
    }
}

impl StdError for ValidationError {}

/// Authentication errors
///
/// Every variant is reported to callers as `Unauthenticated`. Token
/// failures are deliberately a single variant: expired, tampered and
/// malformed tokens are indistinguishable outside this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    InvalidCredentials,
    InvalidToken,
    MissingToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::MissingToken => write!(f, "Authorization required"),
        }
    }
}

impl StdError for AuthError {}

/// Store operation errors
///
/// `NotFound` is the only "absent item" signal; everything else is an
/// infrastructure failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound,
    UnknownTable(String),
    UnknownIndex(String),
    MissingKey(String),
    Serialization(String),
    Unavailable(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "Item not found"),
            StoreError::UnknownTable(table) => write!(f, "Unknown table: {}", table),
            StoreError::UnknownIndex(index) => write!(f, "Unknown index: {}", index),
            StoreError::MissingKey(attr) => write!(f, "Item is missing key attribute: {}", attr),
            StoreError::Serialization(msg) => write!(f, "Item serialization error: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Backend(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Kinds of failure a caller can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthenticated,
    NotFound,
    Conflict,
    InternalFailure,
}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Auth(AuthError),
    /// Missing resource, or a resource that belongs to another user
    NotFound,
    Conflict(String),
    Store(StoreError),
    Config(ConfigError),
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::InvalidInput,
            AppError::Auth(_) => ErrorKind::Unauthenticated,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                ErrorKind::InternalFailure
            }
        }
    }

    /// Message safe to return to a client
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::NotFound => "Resource not found".to_string(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Store(StoreError::Unavailable(_)) => {
                "Storage service temporarily unavailable".to_string()
            }
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn log_error(&self) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "Validation error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(error = %self, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(error = %e, "Authentication error");
            }
            AppError::NotFound => {
                tracing::info!("Resource not found or not owned by caller");
            }
            AppError::Conflict(msg) => {
                tracing::warn!(error = %msg, "Duplicate entry attempt");
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::NotFound => write!(f, "Resource not found"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            other => AppError::Store(other),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log_error();
        HttpResponse::build(self.status_code()).json(ApiResponse::failure(self.public_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is required");
    }

    #[test]
    fn test_store_not_found_maps_to_merged_not_found() {
        let app_err: AppError = StoreError::NotFound.into();
        assert_eq!(app_err.kind(), ErrorKind::NotFound);
        assert_eq!(app_err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_failures_are_internal() {
        let app_err: AppError = StoreError::Unavailable("connection refused".to_string()).into();
        assert_eq!(app_err.kind(), ErrorKind::InternalFailure);
        assert_eq!(app_err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let app_err: AppError = StoreError::Backend("boom".to_string()).into();
        assert_eq!(app_err.kind(), ErrorKind::InternalFailure);
        assert_eq!(app_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_all_auth_errors_are_unauthenticated() {
        for err in [AuthError::InvalidCredentials, AuthError::InvalidToken, AuthError::MissingToken] {
            let app_err: AppError = err.into();
            assert_eq!(app_err.kind(), ErrorKind::Unauthenticated);
            assert_eq!(app_err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let app_err = AppError::Internal("bcrypt exploded".to_string());
        assert_eq!(app_err.public_message(), "Internal server error");
    }
}
