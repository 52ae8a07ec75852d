//! HTTP RPC server for the work service.
//!
//! Provides:
//! - `work_generate`: race every configured solver for a hash
//! - `work_validate`: check a nonce against a difficulty
//! - `work_cancel`: forward a cancel to every work peer
//! - `GET /metrics`: Prometheus text exposition

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{build_router, RpcServer};
