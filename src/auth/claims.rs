/// JWT Claims structure
///
/// The signed payload of an access token. Field names on the wire are
/// `userId`, `email`, `iat`, `exp` and `iss`; timestamps are Unix seconds.

use serde::{Deserialize, Serialize};

use crate::models::User;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iss")]
    pub issuer: String,
}

impl Claims {
    /// Claims for `user`, valid from `now` for `ttl_seconds`
    pub fn new(user: &User, now: i64, ttl_seconds: i64, issuer: &str) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            issued_at: now,
            expires_at: now + ttl_seconds,
            issuer: issuer.to_string(),
        }
    }

    /// Valid only while `expires_at` is strictly in the future
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}
