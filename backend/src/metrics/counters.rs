use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub bookings_confirmed: Arc<AtomicU64>,
    pub bookings_rejected: Arc<AtomicU64>,

    /// Decrements that hit the zero floor: more overlapping reservations
    /// than tables for some slot.
    pub overbook_clamps: Arc<AtomicU64>,

    pub slot_cache_hits: Arc<AtomicU64>,
    pub slot_cache_misses: Arc<AtomicU64>,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
