//! Pending request registry: request id to single-use completion slot.
//!
//! Invariants:
//! - ids come from a monotonically increasing counter and are never reused
//! - a slot is fulfilled at most once
//! - fulfilling an id that was never registered, or was already removed, is a no-op
//! - a [`PendingRequest`] removes its own entry when dropped, so a finished or
//!   abandoned call can never be resurrected by a late notification

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::trace;

use crate::{DpowError, PushNotification};

pub struct RequestRegistry {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<PushNotification>>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate the next request id.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate an id and register a slot for it.
    pub fn register(self: &Arc<Self>) -> PendingRequest {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id, tx);
        self.pending_request(id, rx)
    }

    /// Register a slot for a caller-chosen id.
    pub fn insert(self: &Arc<Self>, id: u64) -> Result<PendingRequest, DpowError> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        if pending.contains_key(&id) {
            return Err(DpowError::DuplicateId(id));
        }
        pending.insert(id, tx);
        drop(pending);
        Ok(self.pending_request(id, rx))
    }

    fn pending_request(
        self: &Arc<Self>,
        id: u64,
        rx: oneshot::Receiver<PushNotification>,
    ) -> PendingRequest {
        PendingRequest {
            id,
            rx,
            registry: Arc::clone(self),
        }
    }

    /// Deliver a push notification. Returns whether a slot was waiting for it.
    pub fn fulfill(&self, notification: PushNotification) -> bool {
        let Some(tx) = self.lock().remove(&notification.id) else {
            trace!(request_id = notification.id, "no pending slot for notification");
            return false;
        };
        tx.send(notification).is_ok()
    }

    /// Drop the slot for `id`. Returns whether one existed.
    pub fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Drop every slot; waiters observe an absent result.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<PushNotification>>> {
        // A poisoned map is still a valid map.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The waiting side of one registered request.
pub struct PendingRequest {
    id: u64,
    rx: oneshot::Receiver<PushNotification>,
    registry: Arc<RequestRegistry>,
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the notification. `None` if the slot was dropped unfulfilled.
    pub async fn wait(mut self) -> Option<PushNotification> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
