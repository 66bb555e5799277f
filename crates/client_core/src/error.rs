use shared::error::GraphDecodeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("{0}")]
    Decode(String),
    #[error("another action is already in progress")]
    Busy,
    #[error("session store has been disposed")]
    Disposed,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Builds the error for a non-2xx response. An empty body falls back to
    /// a generic message carrying the status code.
    pub fn from_status(status: u16, body: String) -> Self {
        let message = if body.is_empty() {
            format!("request failed ({status})")
        } else {
            body
        };
        Self::Transport {
            status: Some(status),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this error replaces the store's visible error. Guard
    /// rejections are returned to the caller only.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::Busy | Self::Disposed)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            status: value.status().map(|status| status.as_u16()),
            message: value.to_string(),
        }
    }
}

impl From<GraphDecodeError> for ClientError {
    fn from(value: GraphDecodeError) -> Self {
        Self::Decode(value.to_string())
    }
}
