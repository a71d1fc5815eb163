use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp_format;

/// A registered user as stored, including the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<Utc>,
}

/// User information safe to hand to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            email: record.email.clone(),
            created_at: record.created_at,
        }
    }
}

/// POST /auth/register body
#[derive(Debug, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth/login body
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login: a bearer token plus the user it was issued to
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}
