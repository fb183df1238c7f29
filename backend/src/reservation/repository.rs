use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::reservation::model::{NewReservation, Reservation, ReservationId};

/// Capacity decision over the rows of one date.
pub type Admission<'a> = &'a (dyn Fn(&[Reservation]) -> Result<bool> + Send + Sync);

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Single atomic insert. Returns the stored row with its assigned id.
    async fn insert(&self, new: &NewReservation) -> Result<Reservation>;

    /// Reads every reservation on `new.date`, asks `admit`, and inserts only
    /// when it returns true. Implementations backed by a shared database run
    /// the read, the decision and the insert as one serialized write
    /// transaction. `Ok(None)` means `admit` refused and nothing was written.
    async fn insert_if(
        &self,
        new: &NewReservation,
        admit: Admission<'_>,
    ) -> Result<Option<Reservation>>;

    /// Fails on any row that cannot be mapped; a partial day would
    /// under-count occupancy.
    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Vec<Reservation>>;

    async fn fetch_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Returns false when no row had that id.
    async fn delete(&self, id: ReservationId) -> Result<bool>;

    async fn count_by_date(&self, date: NaiveDate) -> Result<u64>;
}
