//! Proof-of-work race coordinator.
//!
//! Given a block hash and a difficulty, races every configured solver (work
//! peers over HTTP, a distributed solver over a websocket session, local CPU
//! computation) and returns the first valid answer. Systemic remote failure
//! is recorded in a shared, self-expiring flag so later races hedge with
//! local computation.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod service;
pub mod shutdown;

pub use config::{DpowSection, WorkConfig};
pub use coordinator::{WorkCoordinator, DEFAULT_ROUND_TIMEOUT};
pub use error::CoordinatorError;
pub use metrics::CoordinatorMetrics;
pub use outcome::{Candidate, CandidateFault, Outcome, RawResult};
pub use service::WorkService;
pub use shutdown::ShutdownController;
