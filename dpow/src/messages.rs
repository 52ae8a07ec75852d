//! Wire messages exchanged with the distributed service.

use serde::Serialize;
use serde_json::Value;

use powrace_types::{BlockHash, Difficulty};

/// Websocket submission.
#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub user: &'a str,
    pub api_key: &'a str,
    pub hash: BlockHash,
    pub id: String,
    pub difficulty: Difficulty,
    pub timeout: u64,
}

/// Backup HTTP submission.
#[derive(Debug, Serialize)]
pub struct BackupRequest<'a> {
    pub user: &'a str,
    pub api_key: &'a str,
    pub hash: BlockHash,
    pub difficulty: Difficulty,
}

/// A push message from the session, as the `(id, payload)` pair it arrived as.
///
/// The payload is kept as raw JSON text; the coordinator normalizes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushNotification {
    pub id: u64,
    pub payload: String,
}

impl PushNotification {
    /// Extract the correlation id from a pushed text frame.
    ///
    /// The service echoes ids either as strings or as numbers. Frames without
    /// a usable id (heartbeats, statistics) yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let id = match value.get("id")? {
            Value::String(s) => s.parse().ok()?,
            Value::Number(n) => n.as_u64()?,
            _ => return None,
        };
        Some(Self {
            id,
            payload: text.to_string(),
        })
    }
}
