use crate::domain::error::ValidationError;
use thiserror::Error;

pub const FALLBACK_ERROR_MESSAGE: &str = "Unknown error";

/// Failure reported by the activity store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("not authorized{}", suffix(.message.as_deref()))]
    Unauthorized { message: Option<String> },
    #[error("rejected by store{}{}", status_suffix(.status), suffix(.message.as_deref()))]
    Rejected {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("malformed store response: {message}")]
    Malformed { message: String },
}

impl RemoteError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: None,
            message: Some(message.into()),
        }
    }

    pub fn message(&self) -> Option<&str> {
        let message = match self {
            Self::Transport { message } | Self::Malformed { message } => Some(message.as_str()),
            Self::Unauthorized { message } | Self::Rejected { message, .. } => message.as_deref(),
        };
        message.map(str::trim).filter(|value| !value.is_empty())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (http {code})"))
        .unwrap_or_default()
}

fn suffix(message: Option<&str>) -> String {
    message
        .map(|value| format!(": {value}"))
        .unwrap_or_default()
}

/// User-facing text for a remote failure: the embedded message when there is
/// one, a generic fallback otherwise.
pub fn extract_error_message(error: &RemoteError) -> String {
    error
        .message()
        .unwrap_or(FALLBACK_ERROR_MESSAGE)
        .to_string()
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("failed to fetch activities: {0}")]
    FetchFailed(RemoteError),
    #[error("failed to save activity: {0}")]
    SaveFailed(RemoteError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl InfraError {
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::FetchFailed(error) | Self::SaveFailed(error) => Some(error),
            _ => None,
        }
    }
}
