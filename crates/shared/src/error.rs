use serde::{Deserialize, Serialize};

pub const FALLBACK_PROCESS_ERROR: &str = "Failed to process image";

/// Body returned by the processing endpoint on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    /// Message to show the user, falling back when the server sent none.
    pub fn message_or_fallback(&self) -> String {
        match self.error.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => FALLBACK_PROCESS_ERROR.to_string(),
        }
    }
}
