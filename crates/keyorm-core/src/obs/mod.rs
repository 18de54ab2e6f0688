//! Observability: session events and the sinks that consume them.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{CountingSink, SessionCounters};
pub use sink::{MetricsSink, SessionEvent};
