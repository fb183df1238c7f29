use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;

use crate::reservation::model::{NewReservation, Reservation, ReservationId};
use crate::reservation::repository::{Admission, ReservationRepository};

/// In-memory repository for unit tests.
///
/// Reads yield to the scheduler and `insert_if` is not isolated: the read,
/// the decision and the insert are separate steps that other tasks can
/// interleave with. Whatever keeps concurrent callers correct must come
/// from above the repository.
#[derive(Default)]
pub struct MockReservationRepository {
    pub rows: Mutex<Vec<Reservation>>,
    pub insert_calls: Mutex<usize>,
    /// Every call fails with "Database Offline".
    pub offline: bool,
    /// Only inserts fail; reads keep working.
    pub fail_inserts: bool,
}

impl MockReservationRepository {
    pub fn failing() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    /// Stores rows directly, bypassing any capacity check.
    pub fn seed(&self, rows: impl IntoIterator<Item = NewReservation>) {
        let mut guard = self.rows.lock();
        for new in rows {
            let id = guard.len() as ReservationId + 1;
            guard.push(new.into_reservation(id));
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    fn check_online(&self) -> anyhow::Result<()> {
        if self.offline {
            return Err(anyhow!("Database Offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for MockReservationRepository {
    async fn insert(&self, new: &NewReservation) -> anyhow::Result<Reservation> {
        *self.insert_calls.lock() += 1;
        self.check_online()?;
        if self.fail_inserts {
            return Err(anyhow!("disk I/O error"));
        }

        let mut rows = self.rows.lock();
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let stored = new.clone().into_reservation(id);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn insert_if(
        &self,
        new: &NewReservation,
        admit: Admission<'_>,
    ) -> anyhow::Result<Option<Reservation>> {
        let existing = self.fetch_by_date(new.date).await?;
        if !admit(existing.as_slice())? {
            return Ok(None);
        }
        tokio::task::yield_now().await;
        self.insert(new).await.map(Some)
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Reservation>> {
        self.check_online()?;
        tokio::task::yield_now().await;
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, id: ReservationId) -> anyhow::Result<Option<Reservation>> {
        self.check_online()?;
        Ok(self.rows.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: ReservationId) -> anyhow::Result<bool> {
        self.check_online()?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn count_by_date(&self, date: NaiveDate) -> anyhow::Result<u64> {
        self.check_online()?;
        Ok(self.rows.lock().iter().filter(|r| r.date == date).count() as u64)
    }
}

/// One-hour booking for two at `h:m` on `date`.
pub fn new_reservation(date: NaiveDate, h: u32, m: u32) -> NewReservation {
    new_reservation_for(date, h, m, 60)
}

pub fn new_reservation_for(date: NaiveDate, h: u32, m: u32, duration_minutes: u32) -> NewReservation {
    NewReservation {
        name: "Audrey Horne".to_string(),
        email: "audrey@greatnorthern.com".to_string(),
        party_size: 2,
        date,
        start_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        duration_minutes,
        created_at: Utc::now(),
    }
}
