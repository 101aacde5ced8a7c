use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the client layer.
///
/// Failures are classified by HTTP status only: a 401 becomes
/// [`ClientError::Unauthorized`] after the session has been torn down, any
/// other non-2xx response keeps the backend's message for display.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("session expired")]
    Unauthorized,

    #[error("{}", describe(.status, .message))]
    Api { status: StatusCode, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Replaces the message of an API error that carried none from the backend.
    pub(crate) fn or_message(self, fallback: &str) -> Self {
        match self {
            ClientError::Api { status, message } if message.is_empty() => ClientError::Api {
                status,
                message: fallback.to_string(),
            },
            other => other,
        }
    }
}

fn describe(status: &StatusCode, message: &str) -> String {
    if message.is_empty() {
        format!("request failed ({status})")
    } else {
        message.to_string()
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
