use thiserror::Error;

#[derive(Debug, Error)]
pub enum DpowError {
    #[error("distributed work session is closed")]
    ConnectionClosed,

    #[error("request id {0} is already pending")]
    DuplicateId(u64),

    #[error("backup HTTP request failed: {0}")]
    Http(String),

    #[error("backup endpoint returned HTTP status {0}")]
    Status(u16),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for DpowError {
    fn from(e: reqwest::Error) -> Self {
        DpowError::Http(e.to_string())
    }
}
