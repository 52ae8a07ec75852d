//! Race candidates and the single step that turns whatever a candidate
//! produced into an [`Outcome`].

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use powrace_dpow::{DpowError, PushNotification};
use powrace_peers::PeerError;
use powrace_types::WorkNonce;
use powrace_work::WorkError;

/// One participant in a race.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// A self-hosted peer answering `work_generate` over HTTP.
    Peer { url: String },
    /// The distributed solver, answering through a pushed notification.
    Distributed { request_id: u64 },
    /// The distributed solver's backup HTTP endpoint.
    DistributedFallback,
    /// CPU computation in this process.
    Local,
}

impl Candidate {
    /// Metrics label.
    pub fn source(&self) -> &'static str {
        match self {
            Self::Peer { .. } => "peer",
            Self::Distributed { .. } | Self::DistributedFallback => "distributed",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer { url } => write!(f, "peer {url}"),
            Self::Distributed { request_id } => write!(f, "distributed #{request_id}"),
            Self::DistributedFallback => f.write_str("distributed backup"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// What a candidate resolved to, before interpretation.
#[derive(Clone, Debug, PartialEq)]
pub enum RawResult {
    /// An HTTP JSON body (peer or distributed backup).
    Json(Value),
    /// A pushed distributed notification.
    Pushed(PushNotification),
    /// A nonce computed locally.
    Work(WorkNonce),
    /// Nothing (e.g. the distributed slot was released unfulfilled).
    Absent,
}

/// The interpreted result of one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Work(WorkNonce),
    Error(String),
    Absent,
}

/// A candidate that failed to produce anything interpretable: transport
/// errors, non-2xx responses, malformed bodies.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CandidateFault(String);

impl CandidateFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

impl From<PeerError> for CandidateFault {
    fn from(e: PeerError) -> Self {
        Self(e.to_string())
    }
}

impl From<DpowError> for CandidateFault {
    fn from(e: DpowError) -> Self {
        Self(e.to_string())
    }
}

impl From<WorkError> for CandidateFault {
    fn from(e: WorkError) -> Self {
        Self(e.to_string())
    }
}

impl From<tokio::task::JoinError> for CandidateFault {
    fn from(e: tokio::task::JoinError) -> Self {
        Self(format!("local work task failed: {e}"))
    }
}

impl RawResult {
    /// Interpret the result.
    ///
    /// A body carrying `work` is a win if the value parses as a nonce and a
    /// fault otherwise. A body carrying only `error` is a solver error.
    /// Anything else, including JSON `null`, is absent.
    pub fn normalize(self) -> Result<Outcome, CandidateFault> {
        match self {
            Self::Absent => Ok(Outcome::Absent),
            Self::Work(nonce) => Ok(Outcome::Work(nonce)),
            Self::Json(body) => normalize_body(&body),
            Self::Pushed(notification) => {
                let body: Value = serde_json::from_str(&notification.payload).map_err(|e| {
                    CandidateFault::new(format!(
                        "unparseable notification #{}: {e}",
                        notification.id
                    ))
                })?;
                normalize_body(&body)
            }
        }
    }
}

fn normalize_body(body: &Value) -> Result<Outcome, CandidateFault> {
    if let Some(work) = body.get("work") {
        let text = work
            .as_str()
            .ok_or_else(|| CandidateFault::new(format!("work is not a string: {work}")))?;
        return WorkNonce::from_hex(text)
            .map(Outcome::Work)
            .map_err(|e| CandidateFault::new(format!("malformed work {text:?}: {e}")));
    }
    match body.get("error") {
        Some(Value::String(message)) => Ok(Outcome::Error(message.clone())),
        Some(other) => Ok(Outcome::Error(other.to_string())),
        None => Ok(Outcome::Absent),
    }
}
