/// JWT Token Issuing and Verification
///
/// Access tokens are HS256-signed, carry `Claims`, and expire 24 hours
/// after issuance. There is no revocation list: a token stays valid until
/// it expires, even across logout or a password change.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::SigningSecret;
use crate::error::{AppError, AuthError};
use crate::models::User;

/// `iss` claim identifying this service
pub const TOKEN_ISSUER: &str = "notebox";

/// Access token lifetime: 24 hours
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

const BEARER_PREFIX: &str = "Bearer ";

/// Issues and verifies access tokens with a fixed, read-only secret.
///
/// Holds no mutable state, so one instance can be shared by every worker.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &SigningSecret) -> Self {
        if secret.is_development_fallback() {
            tracing::warn!("Token service is signing with the development fallback secret");
        }

        // Only HS256 is accepted; tokens declaring any other algorithm fail
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Mint a token for `user`, valid for 24 hours from now
    ///
    /// # Errors
    /// Returns `Internal` if signing fails
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    fn issue_at(&self, user: &User, now: i64) -> Result<String, AppError> {
        let claims = Claims::new(user, now, ACCESS_TOKEN_TTL_SECONDS, TOKEN_ISSUER);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify a token, optionally prefixed with `Bearer `, and return its claims
    ///
    /// # Errors
    /// Any structural, signature, algorithm, issuer or expiry failure is
    /// reported as the same `AuthError::InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AppError> {
        let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    JwtErrorKind::ExpiredSignature => "expired",
                    JwtErrorKind::InvalidSignature => "bad signature",
                    JwtErrorKind::InvalidAlgorithm => "unexpected algorithm",
                    JwtErrorKind::InvalidIssuer => "wrong issuer",
                    JwtErrorKind::MissingRequiredClaim(_) => "missing claim",
                    _ => "malformed",
                };
                tracing::warn!(reason, "JWT validation failed");
                AppError::Auth(AuthError::InvalidToken)
            })?;

        if claims.is_expired_at(now) {
            tracing::warn!(reason = "expired", "JWT validation failed");
            return Err(AppError::Auth(AuthError::InvalidToken));
        }

        Ok(claims)
    }
}
