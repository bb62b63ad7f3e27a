use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Non-success status; `message` is the server's `error` field or the fallback.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response from processing server: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl ProcessError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::Read { .. } | Self::MalformedResponse(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("missing data: scheme")]
    MissingScheme,
    #[error("data URL has no payload separator")]
    MissingPayload,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}
