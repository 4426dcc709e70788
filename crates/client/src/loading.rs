//! Loading aggregator.
//!
//! Lets N independently-loading rows (cart line items resolving their own
//! product detail, in-flight order mutations) report readiness without the
//! parent keeping per-row bookkeeping. The aggregate signal is a join: it
//! stays busy until the last outstanding row finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reference-counted busy signal. Cheaply cloneable; clones share the
/// counter.
#[derive(Debug, Clone, Default)]
pub struct LoadGauge {
    pending: Arc<AtomicUsize>,
}

impl LoadGauge {
    /// A gauge with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one in-flight load. The returned token ends it exactly once,
    /// either via [`LoadToken::end`] or when dropped, so the counter can
    /// never go negative and an abandoned row cannot leave the gauge stuck
    /// busy.
    #[must_use = "dropping the token immediately ends the load"]
    pub fn begin(&self) -> LoadToken {
        self.pending.fetch_add(1, Ordering::AcqRel);
        LoadToken {
            pending: Some(Arc::clone(&self.pending)),
        }
    }

    /// Whether any load is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending() > 0
    }

    /// Number of outstanding loads.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Handle for one in-flight load registered with [`LoadGauge::begin`].
#[derive(Debug)]
pub struct LoadToken {
    pending: Option<Arc<AtomicUsize>>,
}

impl LoadToken {
    /// End the load. Equivalent to dropping the token; provided so call
    /// sites can mark the end explicitly.
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for LoadToken {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.fetch_sub(1, Ordering::AcqRel);
        }
    }
}
