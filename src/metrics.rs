//! Engine counters, kept as process-wide atomics so the scheduler loop and
//! the `status` command can read them without plumbing.

use std::sync::atomic::{AtomicU64, Ordering};

static TICKS_PROCESSED: AtomicU64 = AtomicU64::new(0);
static QUEST_SUCCESSES: AtomicU64 = AtomicU64::new(0);
static QUEST_FAILURES: AtomicU64 = AtomicU64::new(0);
static EVENTS_DELIVERED: AtomicU64 = AtomicU64::new(0);
static NOTIFY_FAILURES: AtomicU64 = AtomicU64::new(0);
static UPDATE_ERRORS: AtomicU64 = AtomicU64::new(0);

pub fn inc_ticks_processed() {
    TICKS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_quest_successes() {
    QUEST_SUCCESSES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_quest_failures() {
    QUEST_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_events_delivered() {
    EVENTS_DELIVERED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_notify_failures() {
    NOTIFY_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_update_errors() {
    UPDATE_ERRORS.fetch_add(1, Ordering::Relaxed);
}

/// Point-in-time view of all counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCounters {
    pub ticks_processed: u64,
    pub quest_successes: u64,
    pub quest_failures: u64,
    pub events_delivered: u64,
    pub notify_failures: u64,
    pub update_errors: u64,
}

pub fn snapshot() -> EngineCounters {
    EngineCounters {
        ticks_processed: TICKS_PROCESSED.load(Ordering::Relaxed),
        quest_successes: QUEST_SUCCESSES.load(Ordering::Relaxed),
        quest_failures: QUEST_FAILURES.load(Ordering::Relaxed),
        events_delivered: EVENTS_DELIVERED.load(Ordering::Relaxed),
        notify_failures: NOTIFY_FAILURES.load(Ordering::Relaxed),
        update_errors: UPDATE_ERRORS.load(Ordering::Relaxed),
    }
}
