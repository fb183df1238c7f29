use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::logger::warn_if_slow;
use crate::reservation::model::{NewReservation, Reservation, ReservationId};
use crate::reservation::repository::{Admission, ReservationRepository};

/// Reservation persistence facade shared by the calculator and the coordinator.
///
/// Holds no state of its own; every read goes to the repository so callers
/// always see the current persisted truth.
pub struct ReservationStore {
    repo: Arc<dyn ReservationRepository>,
}

impl ReservationStore {
    pub fn new(repo: Arc<dyn ReservationRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self), target = "store", fields(%date))]
    pub async fn reservations_on(&self, date: NaiveDate) -> Result<Vec<Reservation>> {
        let rows = warn_if_slow("db_fetch_by_date", Duration::from_millis(100), async {
            self.repo.fetch_by_date(date).await
        })
        .await
        .context("failed to fetch reservations for date")?;

        debug!(count = rows.len(), "loaded reservations for date");
        Ok(rows)
    }

    #[instrument(
        skip(self, new),
        target = "store",
        fields(date = %new.date, start_time = %new.start_time, party_size = new.party_size)
    )]
    pub async fn insert(&self, new: &NewReservation) -> Result<Reservation> {
        let stored = warn_if_slow("db_insert", Duration::from_millis(100), async {
            self.repo.insert(new).await
        })
        .await
        .context("failed to persist reservation")?;

        info!(reservation_id = stored.id, "reservation persisted");
        Ok(stored)
    }

    /// Inserts `new` only if `admit` accepts the date's current rows, checked
    /// and written atomically. `None` when refused.
    #[instrument(
        skip(self, new, admit),
        target = "store",
        fields(date = %new.date, start_time = %new.start_time, party_size = new.party_size)
    )]
    pub async fn insert_if_admitted(
        &self,
        new: &NewReservation,
        admit: Admission<'_>,
    ) -> Result<Option<Reservation>> {
        let stored = warn_if_slow("db_guarded_insert", Duration::from_millis(250), async {
            self.repo.insert_if(new, admit).await
        })
        .await
        .context("failed to run guarded reservation insert")?;

        match &stored {
            Some(r) => info!(reservation_id = r.id, "reservation persisted"),
            None => debug!("guarded insert refused by capacity check"),
        }
        Ok(stored)
    }

    #[instrument(skip(self), target = "store", fields(reservation_id = id))]
    pub async fn load_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        debug!("fetching reservation by id from repository");

        let found = warn_if_slow("db_fetch_by_id", Duration::from_millis(100), async {
            self.repo.fetch_by_id(id).await
        })
        .await
        .context("repository fetch failed")?;

        if found.is_none() {
            warn!("reservation lookup returned no results");
        }
        Ok(found)
    }

    #[instrument(skip(self), target = "store", fields(reservation_id = id))]
    pub async fn delete(&self, id: ReservationId) -> Result<bool> {
        let removed = warn_if_slow("db_delete", Duration::from_millis(100), async {
            self.repo.delete(id).await
        })
        .await
        .context("failed to delete reservation")?;

        info!(removed, "reservation delete processed");
        Ok(removed)
    }

    #[instrument(skip(self), target = "store", fields(%date))]
    pub async fn count_on(&self, date: NaiveDate) -> Result<u64> {
        self.repo
            .count_by_date(date)
            .await
            .context("failed to count reservations for date")
    }
}
