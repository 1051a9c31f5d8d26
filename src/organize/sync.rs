//! Concurrency primitives the organizers share: the `Synchronizer` join
//! barrier and the two-tier `PriorityLock` chain mutex (spec.md §5, §9).
//!
//! Grounded on the teacher's `state/mod.rs` lock fields
//! (`block_processing_lock`/`reorg_lock`) generalized from "two named
//! mutexes" into the explicit prioritized-region primitive spec.md §5
//! describes ("not readers/writers"): a high-priority block-organizer
//! region that a low-priority transaction-organizer region always yields
//! to.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// A join-count barrier that arms a single terminal callback when
/// `expected` workers have completed, or as soon as any worker reports a
/// failure (spec.md §9, "phase completion token"). Exactly one terminal
/// event fires.
pub struct Synchronizer {
    expected: usize,
    completed: AtomicUsize,
    failed: AtomicBool,
    stopped: AtomicBool,
}

impl Synchronizer {
    pub fn new(expected: usize) -> Self {
        Self { expected, completed: AtomicUsize::new(0), failed: AtomicBool::new(false), stopped: AtomicBool::new(false) }
    }

    /// Record one worker's success. Returns `true` if this call observed
    /// the final completion (all workers done, no prior failure).
    pub fn complete_one(&self) -> bool {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        done == self.expected && !self.failed.load(Ordering::SeqCst)
    }

    /// Record a worker's failure. The first caller to set this wins;
    /// later callers observe `false` and must not re-fire the handler.
    pub fn fail(&self) -> bool {
        !self.failed.swap(true, Ordering::SeqCst)
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Cooperative cancellation, observed at bucket boundaries (spec.md
    /// §5 "Cancellation").
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Which side of the chain mutex a caller is requesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Low,
}

struct State {
    high_active: bool,
    high_waiting: usize,
    low_active: bool,
}

/// The process-wide chain mutex: a prioritized two-region lock, not a
/// classic readers/writers lock. The block organizer always acquires
/// the high-priority region; the transaction organizer's low-priority
/// region yields to any pending or active high-priority request
/// (spec.md §5).
pub struct PriorityLock {
    state: Mutex<State>,
    cond: Condvar,
}

pub struct PriorityGuard<'a> {
    lock: &'a PriorityLock,
    priority: Priority,
}

impl Drop for PriorityGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().unwrap();
        match self.priority {
            Priority::High => state.high_active = false,
            Priority::Low => state.low_active = false,
        }
        self.lock.cond.notify_all();
    }
}

impl Default for PriorityLock {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityLock {
    pub fn new() -> Self {
        Self { state: Mutex::new(State { high_active: false, high_waiting: 0, low_active: false }), cond: Condvar::new() }
    }

    pub fn acquire_high(&self) -> PriorityGuard<'_> {
        let mut state = self.state.lock().unwrap();
        state.high_waiting += 1;
        state = self.cond.wait_while(state, |s| s.high_active || s.low_active).unwrap();
        state.high_waiting -= 1;
        state.high_active = true;
        drop(state);
        PriorityGuard { lock: self, priority: Priority::High }
    }

    /// Blocks until no high-priority request is active *or waiting*.
    pub fn acquire_low(&self) -> PriorityGuard<'_> {
        let mut state = self.state.lock().unwrap();
        state = self
            .cond
            .wait_while(state, |s| s.high_active || s.low_active || s.high_waiting > 0)
            .unwrap();
        state.low_active = true;
        drop(state);
        PriorityGuard { lock: self, priority: Priority::Low }
    }
}
