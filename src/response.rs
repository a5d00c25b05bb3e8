use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// ApiResponse
///
/// The one JSON envelope every endpoint answers with, on success and on failure.
/// `data` carries the payload of a success; `error` carries a stable error code
/// on failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// A success with nothing to return beyond the message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: &str) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
            error: Some(code.to_string()),
        }
    }
}
