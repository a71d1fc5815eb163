/// Response envelope
///
/// Every endpoint answers with `{success, message, data?}`. The payload is
/// a closed set of shapes rather than an arbitrary JSON value.

use serde::Serialize;

use crate::models::{Note, Session, User};

/// Typed payload carried in `data`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    User(User),
    Session(Session),
    Note(Note),
    Notes(Vec<Note>),
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, data: ResponseData) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Successful outcome with nothing to return
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
