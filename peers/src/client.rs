//! HTTP client for work peers.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::PeerError;
use crate::messages::{WorkCancelAction, WorkGenerateAction};
use powrace_types::{BlockHash, WorkRequest};

/// Default bound on a single `work_generate` round trip.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the work peers' node RPC.
///
/// Cheap to clone; every clone shares one connection pool.
#[derive(Clone)]
pub struct PeerClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
}

impl PeerClient {
    /// Create a client whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| PeerError::RequestFailed(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http_client })
    }

    /// Ask one peer for work.
    ///
    /// Returns the peer's JSON body as-is; interpreting `work` vs `error` is
    /// the caller's job.
    pub async fn request(&self, url: &str, request: &WorkRequest) -> Result<Value, PeerError> {
        self.post_json(url, &WorkGenerateAction::new(*request))
            .await
    }

    /// POST a JSON body and parse a JSON response.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Value, PeerError> {
        let response = self.http_client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(PeerError::Status(response.status().as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Tell one peer to abandon work on `hash`.
    ///
    /// Fire-and-forget: the request runs on its own task and failures are
    /// only logged. The handle is returned for callers that want to wait.
    pub fn cancel(&self, url: &str, hash: &BlockHash) -> JoinHandle<()> {
        let client = self.clone();
        let url = url.to_string();
        let body = WorkCancelAction::new(*hash);
        tokio::spawn(async move {
            if let Err(e) = client.post_json(&url, &body).await {
                debug!(%url, hash = %body.hash, error = %e, "work_cancel failed");
            }
        })
    }

    /// Send `work_cancel` to every peer in `urls`.
    pub fn broadcast_cancel(&self, urls: &[String], hash: &BlockHash) -> Vec<JoinHandle<()>> {
        urls.iter().map(|url| self.cancel(url, hash)).collect()
    }
}
