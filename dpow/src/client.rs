//! Websocket session and backup HTTP path.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::messages::{BackupRequest, SessionRequest};
use crate::{DpowConfig, DpowError, PendingRequest, PushNotification, RequestRegistry};
use powrace_types::WorkRequest;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type SharedSink = Arc<Mutex<Option<WsSink>>>;

/// Client for one distributed proof-of-work service.
///
/// [`DpowClient::connect`] starts a background session task that keeps a
/// websocket open (reconnecting after `reconnect_delay`), routes push messages
/// into the [`RequestRegistry`], and stops on [`DpowClient::shutdown`].
pub struct DpowClient {
    config: DpowConfig,
    registry: Arc<RequestRegistry>,
    http: reqwest::Client,
    sink: SharedSink,
    shutdown_tx: broadcast::Sender<()>,
    session: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl DpowClient {
    /// Build the client and start its session task.
    pub fn connect(config: DpowConfig) -> Result<Self, DpowError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let registry = Arc::new(RequestRegistry::new());
        let sink: SharedSink = Arc::new(Mutex::new(None));
        let (shutdown_tx, _) = broadcast::channel(1);

        let session = tokio::spawn(run_session(
            config.ws_url.clone(),
            config.reconnect_delay,
            Arc::clone(&sink),
            Arc::clone(&registry),
            shutdown_tx.subscribe(),
        ));

        info!(
            provider = config.provider.as_str(),
            url = %config.ws_url,
            "distributed work client started"
        );
        Ok(Self {
            config,
            registry,
            http,
            sink,
            shutdown_tx,
            session: std::sync::Mutex::new(Some(session)),
        })
    }

    pub fn config(&self) -> &DpowConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    /// Allocate a request id and its completion slot.
    pub fn register(&self) -> PendingRequest {
        self.registry.register()
    }

    /// Whether a websocket session is currently open.
    pub async fn is_connected(&self) -> bool {
        self.sink.lock().await.is_some()
    }

    /// Submit `request` over the websocket under `id`.
    ///
    /// Fails with [`DpowError::ConnectionClosed`] when no session is open or
    /// the frame cannot be written; the session task reconnects on its own.
    pub async fn submit(&self, id: u64, request: &WorkRequest) -> Result<(), DpowError> {
        let body = serde_json::to_string(&SessionRequest {
            user: &self.config.user,
            api_key: &self.config.api_key,
            hash: request.hash,
            id: id.to_string(),
            difficulty: self.config.effective_difficulty(request.difficulty),
            timeout: self.config.request_timeout.as_secs(),
        })?;

        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(DpowError::ConnectionClosed);
        };
        if let Err(e) = sink.send(Message::Text(body)).await {
            warn!(request_id = id, error = %e, "websocket send failed");
            *guard = None;
            return Err(DpowError::ConnectionClosed);
        }
        debug!(request_id = id, hash = %request.hash, "submitted work over websocket");
        Ok(())
    }

    /// Submit `request` as a one-shot POST to the backup endpoint.
    pub async fn submit_http(&self, request: &WorkRequest) -> Result<Value, DpowError> {
        let body = BackupRequest {
            user: &self.config.user,
            api_key: &self.config.api_key,
            hash: request.hash,
            difficulty: request.difficulty,
        };
        let response = self
            .http
            .post(&self.config.fallback_url)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DpowError::Status(response.status().as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }

    /// Stop the session task and release every outstanding slot.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let handle = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "distributed work session task failed");
            }
        }
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        self.registry.clear();
        info!("distributed work client stopped");
    }
}

impl Drop for DpowClient {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Keep a session open until shutdown.
async fn run_session(
    url: String,
    reconnect_delay: Duration,
    sink: SharedSink,
    registry: Arc<RequestRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let connected = tokio::select! {
            _ = shutdown.recv() => return,
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((stream, _)) => {
                info!(%url, "distributed work session connected");
                let (writer, reader) = stream.split();
                *sink.lock().await = Some(writer);

                let stopped = read_pushes(reader, &registry, &mut shutdown).await;
                *sink.lock().await = None;
                if stopped {
                    return;
                }
                warn!(%url, "distributed work session closed");
            }
            Err(e) => {
                warn!(%url, error = %e, "distributed work session connect failed");
            }
        }

        tokio::select! {
            _ = shutdown.recv() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

/// Route push messages into the registry. Returns `true` if shutdown was requested.
async fn read_pushes(
    mut reader: SplitStream<WsStream>,
    registry: &RequestRegistry,
    shutdown: &mut broadcast::Receiver<()>,
) -> bool {
    loop {
        let message = tokio::select! {
            _ = shutdown.recv() => return true,
            message = reader.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => match PushNotification::parse(&text) {
                Some(notification) => {
                    let id = notification.id;
                    if !registry.fulfill(notification) {
                        debug!(request_id = id, "late or unknown notification dropped");
                    }
                }
                None => debug!("ignoring push without request id"),
            },
            Some(Ok(Message::Close(_))) | None => return false,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "distributed work session read error");
                return false;
            }
        }
    }
}
