use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle locks kept around before the map is swept.
const SWEEP_THRESHOLD: usize = 64;

/// Per-date advisory locks.
///
/// Bookings for the same date are serialized so the capacity check and the
/// insert happen as one step. Different dates never contend.
#[derive(Default)]
pub struct DateLocks {
    locks: parking_lot::Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns the lock for `date`. Released on drop.
    pub async fn acquire(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock();
            if map.len() >= SWEEP_THRESHOLD {
                // Only the map holds an idle lock; nobody can be waiting on it.
                map.retain(|_, l| Arc::strong_count(l) > 1);
            }
            map.entry(date).or_default().clone()
        };

        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, d).unwrap()
    }

    #[tokio::test]
    async fn same_date_is_exclusive() {
        let locks = DateLocks::new();
        let _held = locks.acquire(day(5)).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(day(5))).await;
        assert!(second.is_err(), "second holder must wait");
    }

    #[tokio::test]
    async fn different_dates_do_not_contend() {
        let locks = DateLocks::new();
        let _held = locks.acquire(day(5)).await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire(day(6))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn released_lock_can_be_retaken() {
        let locks = DateLocks::new();
        drop(locks.acquire(day(5)).await);

        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(day(5))).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn idle_locks_are_swept() {
        let locks = DateLocks::new();
        let start = day(1);
        for i in 0..(SWEEP_THRESHOLD as u64 + 10) {
            let d = start + chrono::Days::new(i);
            drop(locks.acquire(d).await);
        }

        assert!(locks.len() <= SWEEP_THRESHOLD + 1);
    }
}
