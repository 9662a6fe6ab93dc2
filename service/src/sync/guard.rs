//! Mutual exclusion for sync runs.
//!
//! At most one sync may touch the members/bills tables at a time. The
//! guard is a compare-and-swap flag, not an advisory boolean: a second
//! trigger racing the first loses the exchange and is told a sync is
//! already running.

use std::sync::atomic::{AtomicBool, Ordering};

/// Single-slot permit source for sync runs.
#[derive(Debug, Default)]
pub struct SyncGuard {
    running: AtomicBool,
}

impl SyncGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the sync slot. Returns `None` when a sync is already
    /// running; the returned permit releases the slot on drop.
    #[must_use]
    pub fn try_acquire(&self) -> Option<SyncPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncPermit { guard: self })
    }

    /// Whether a sync currently holds the slot.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// RAII permit for one sync run.
#[derive(Debug)]
pub struct SyncPermit<'a> {
    guard: &'a SyncGuard,
}

impl Drop for SyncPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
