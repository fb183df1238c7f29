use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::availability::slots::SlotMap;

/// Short-lived per-date cache of computed slot maps.
///
/// Serves availability queries (form pre-population) only. Booking commits
/// never read from it; successful writes invalidate the affected date.
///
/// Each date carries a generation bumped by `invalidate`. A map computed
/// before a write finished is refused by `put` instead of being served for
/// a full TTL.
pub struct SlotCache {
    ttl: Duration,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<NaiveDate, (Instant, SlotMap)>,
    generations: HashMap<NaiveDate, u64>,
}

impl SlotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// A zero TTL turns the cache into a pass-through.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Returns a fresh entry, dropping it if it has expired.
    pub fn get(&self, date: NaiveDate) -> Option<SlotMap> {
        self.get_at(date, Instant::now())
    }

    fn get_at(&self, date: NaiveDate, now: Instant) -> Option<SlotMap> {
        let mut inner = self.inner.lock();
        let entries = &mut inner.entries;
        match entries.get(&date) {
            Some((stored_at, slots)) if now.duration_since(*stored_at) < self.ttl => {
                Some(slots.clone())
            }
            Some(_) => {
                entries.remove(&date);
                None
            }
            None => None,
        }
    }

    /// Read before computing a map, then handed back to `put`.
    pub fn generation(&self, date: NaiveDate) -> u64 {
        self.inner.lock().generations.get(&date).copied().unwrap_or(0)
    }

    /// Stores `slots` unless `date` was invalidated after `seen` was read.
    /// Returns whether the map was stored.
    pub fn put(&self, date: NaiveDate, slots: SlotMap, seen: u64) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut inner = self.inner.lock();
        if inner.generations.get(&date).copied().unwrap_or(0) != seen {
            return false;
        }
        inner.entries.insert(date, (Instant::now(), slots));
        true
    }

    #[instrument(skip(self), target = "cache")]
    pub fn invalidate(&self, date: NaiveDate) {
        let mut inner = self.inner.lock();
        *inner.generations.entry(date).or_insert(0) += 1;
        let removed = inner.entries.remove(&date).is_some();
        debug!(removed, "slot cache entry invalidated");
    }

    /// Drops every entry. Generations are kept so in-flight puts stay refused.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
