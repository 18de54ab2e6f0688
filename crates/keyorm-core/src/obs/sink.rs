//! Metrics sink boundary.
//!
//! Session code never counts anything itself; all instrumentation flows
//! through `SessionEvent` and `MetricsSink`.

use crate::db::sql::StatementKind;

///
/// SessionEvent
///

#[derive(Clone, Copy, Debug)]
pub enum SessionEvent {
    StatementIssued {
        kind: StatementKind,
        table: &'static str,
        rows: u64,
    },
    CacheHit {
        entity: &'static str,
    },
    CacheMiss {
        entity: &'static str,
    },
    /// A relation slot was resolved through the session.
    LazyLoad {
        entity: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Sync {
    fn record(&self, event: SessionEvent);
}

/// Forward an event to an installed sink, if any.
pub(crate) fn record(sink: Option<&dyn MetricsSink>, event: SessionEvent) {
    if let Some(sink) = sink {
        sink.record(event);
    }
}
