use crate::{
    db::sql::StatementKind,
    obs::sink::{MetricsSink, SessionEvent},
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

///
/// CountingSink
/// In-memory sink keeping one atomic counter per event class.
///

#[derive(Debug, Default)]
pub struct CountingSink {
    selects: AtomicU64,
    counts: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    rows: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    lazy_loads: AtomicU64,
}

impl CountingSink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selects: AtomicU64::new(0),
            counts: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            rows: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            lazy_loads: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionCounters {
        let get = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        SessionCounters {
            selects: get(&self.selects),
            counts: get(&self.counts),
            inserts: get(&self.inserts),
            updates: get(&self.updates),
            deletes: get(&self.deletes),
            rows: get(&self.rows),
            cache_hits: get(&self.cache_hits),
            cache_misses: get(&self.cache_misses),
            lazy_loads: get(&self.lazy_loads),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.selects,
            &self.counts,
            &self.inserts,
            &self.updates,
            &self.deletes,
            &self.rows,
            &self.cache_hits,
            &self.cache_misses,
            &self.lazy_loads,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl MetricsSink for CountingSink {
    fn record(&self, event: SessionEvent) {
        let bump = |counter: &AtomicU64, by: u64| {
            counter.fetch_add(by, Ordering::Relaxed);
        };

        match event {
            SessionEvent::StatementIssued { kind, rows, .. } => {
                let counter = match kind {
                    StatementKind::Select => &self.selects,
                    StatementKind::Count => &self.counts,
                    StatementKind::Insert => &self.inserts,
                    StatementKind::Update => &self.updates,
                    StatementKind::Delete => &self.deletes,
                };
                bump(counter, 1);
                bump(&self.rows, rows);
            }
            SessionEvent::CacheHit { .. } => bump(&self.cache_hits, 1),
            SessionEvent::CacheMiss { .. } => bump(&self.cache_misses, 1),
            SessionEvent::LazyLoad { .. } => bump(&self.lazy_loads, 1),
        }
    }
}

///
/// SessionCounters
/// Point-in-time copy of a `CountingSink`.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SessionCounters {
    pub selects: u64,
    pub counts: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    /// Rows returned by selects plus rows affected by writes.
    pub rows: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub lazy_loads: u64,
}

impl SessionCounters {
    /// Statements of any kind.
    #[must_use]
    pub const fn statements(&self) -> u64 {
        self.selects + self.counts + self.inserts + self.updates + self.deletes
    }
}
