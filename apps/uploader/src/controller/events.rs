//! UI/backend events and error modeling for the uploader.

use client_core::UploadEvent;

pub enum UiEvent {
    Info(String),
    Upload(UploadEvent),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Server,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Download,
    SaveResult,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("error sending request")
            || message_lower.contains("connection")
            || message_lower.contains("timed out")
            || message_lower.contains("dns")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("http status")
            || message_lower.contains("server error")
            || message_lower.contains("client error")
        {
            UiErrorCategory::Server
        } else if message_lower.contains("permission denied")
            || message_lower.contains("no such file")
            || message_lower.contains("failed to save")
            || message_lower.contains("read-only")
        {
            UiErrorCategory::Storage
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Single-line text for the status bar.
    pub fn status_line(&self) -> String {
        let prefix = match self.context {
            UiErrorContext::BackendStartup => "Backend unavailable",
            UiErrorContext::Download => "Download failed",
            UiErrorContext::SaveResult => "Save failed",
        };
        match self.category {
            UiErrorCategory::Transport => {
                format!("{prefix}: server unreachable; check the URL/network ({})", self.message)
            }
            _ => format!("{prefix}: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_refused_connection_as_transport() {
        let err = UiError::from_message(
            UiErrorContext::Download,
            "error sending request for url (http://localhost:5000/download/a.jpg)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert!(err.status_line().starts_with("Download failed: server unreachable"));
    }

    #[test]
    fn classifies_status_errors_as_server() {
        let err = UiError::from_message(
            UiErrorContext::Download,
            "HTTP status client error (404 Not Found) for url (http://localhost:5000/download/x)",
        );
        assert_eq!(err.category(), UiErrorCategory::Server);
    }

    #[test]
    fn classifies_write_failures_as_storage() {
        let err = UiError::from_message(
            UiErrorContext::SaveResult,
            "Failed to save /tmp/out.jpg: Permission denied (os error 13)",
        );
        assert_eq!(err.category(), UiErrorCategory::Storage);
        assert_eq!(err.context(), UiErrorContext::SaveResult);
        assert_eq!(
            err.status_line(),
            "Save failed: Failed to save /tmp/out.jpg: Permission denied (os error 13)"
        );
    }
}
