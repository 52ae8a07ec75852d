//! Work peers: self-operated nodes that generate proof-of-work over HTTP.
//!
//! Design:
//! - Each peer exposes the node RPC: `POST {action: "work_generate", hash, difficulty}`
//! - Responses carry either a `work` field or an `error` field
//! - Once a race is won, every peer gets a best-effort `work_cancel` so it stops burning CPU
//! - No retries here; retry policy belongs to the caller's next race

pub mod client;
pub mod error;
pub mod messages;

pub use client::{PeerClient, DEFAULT_PEER_TIMEOUT};
pub use error::PeerError;
pub use messages::{WorkCancelAction, WorkGenerateAction};
