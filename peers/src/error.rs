use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("HTTP request to work peer failed: {0}")]
    RequestFailed(String),

    #[error("work peer unreachable: {0}")]
    Unreachable(String),

    #[error("work peer returned HTTP status {0}")]
    Status(u16),

    #[error("invalid response from work peer: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for PeerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PeerError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            PeerError::Unreachable(format!("connection failed: {e}"))
        } else if e.is_decode() {
            PeerError::InvalidResponse(e.to_string())
        } else {
            PeerError::RequestFailed(e.to_string())
        }
    }
}
