//! Shared utilities for the work-generation workspace.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::{format_duration, Clock, SystemClock};
