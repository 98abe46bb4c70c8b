//! Magnet Metrics
//!
//! Observational counters for the gateway. Nothing here carries a
//! correctness dependency: the counters exist so operators can watch cache
//! effectiveness and failure rates through the built-in `/_metrics` and
//! `/_info` endpoints.
//!
//! # Components
//!
//! - [`GatewayMetricsCollector`] - lock-free atomic counters updated on
//!   every request
//! - [`MetricsSnapshot`] / [`ServerInfo`] - serializable views returned by
//!   the built-in endpoints

pub mod collector;
pub mod snapshot;

pub use collector::{GatewayMetricsCollector, RequestOutcome};
pub use snapshot::{MetricsSnapshot, ServerInfo, ServerType};
