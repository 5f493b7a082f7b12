use crate::BenchError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// Index of a claimed unit of work, counting down from `seed - 1` to `0`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WorkItem(pub u64);

/// Lock-free countdown shared by every worker of one measurement.
#[derive(Debug)]
pub struct WorkDispatcher {
    remaining: AtomicI64,
}

impl WorkDispatcher {
    /// Non-positive seeds hand out nothing.
    pub fn new(seed: i64) -> Self {
        // Clamping keeps the countdown far from wrapping past i64::MIN.
        Self {
            remaining: AtomicI64::new(seed.max(0)),
        }
    }

    /// Decrements the counter and wins the unit if the decremented value is still non-negative.
    pub fn claim(&self) -> Option<WorkItem> {
        // Exclusivity only depends on the read-modify-write being atomic.
        let previous = self.remaining.fetch_sub(1, Ordering::Relaxed);
        let index = previous.checked_sub(1)?;
        u64::try_from(index).ok().map(WorkItem)
    }

    pub fn remaining(&self) -> u64 {
        u64::try_from(self.remaining.load(Ordering::Relaxed)).unwrap_or(0)
    }
}

/// Holds the first failure reported by any worker of one measurement.
#[derive(Debug, Default)]
pub struct FailureSlot {
    first: Mutex<Option<BenchError>>,
}

impl FailureSlot {
    /// Stores `failure` if the slot is empty. Returns `false` when an earlier failure was kept.
    pub fn record(&self, failure: BenchError) -> bool {
        let mut slot = self.first.lock();
        if slot.is_some() {
            tracing::debug!(error = %failure, "dropping failure, slot already taken");
            return false;
        }
        *slot = Some(failure);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.first.lock().is_none()
    }

    pub fn take(&self) -> Option<BenchError> {
        self.first.lock().take()
    }

    pub fn into_inner(self) -> Option<BenchError> {
        self.first.into_inner()
    }
}
