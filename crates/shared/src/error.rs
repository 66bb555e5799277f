use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed project graph: {message}")]
pub struct GraphDecodeError {
    pub message: String,
}

impl GraphDecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for GraphDecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value.to_string())
    }
}
