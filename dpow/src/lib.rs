//! Distributed proof-of-work service client.
//!
//! Work requests go out over a persistent websocket session and results come
//! back as asynchronous push messages correlated by an application-assigned
//! request id. When the session is down, a request can instead be sent as a
//! one-shot HTTP POST to the service's backup endpoint.
//!
//! - [`RequestRegistry`] maps request ids to single-use completion slots
//! - [`DpowClient`] owns the session task, the registry and the HTTP client

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod registry;

pub use client::DpowClient;
pub use config::{DpowConfig, DpowProvider};
pub use error::DpowError;
pub use messages::PushNotification;
pub use registry::{PendingRequest, RequestRegistry};
