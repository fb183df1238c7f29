use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::availability::cache::SlotCache;
use crate::availability::slots::{self, SlotMap, SlotParams};
use crate::config::VenueConfig;
use crate::error::AppError;
use crate::metrics::counters::Counters;
use crate::reservation::model::Reservation;
use crate::reservation::store::ReservationStore;

/// Availability over the reservation store.
///
/// `compute_slots` always reads current persisted state. `available_slots`
/// may answer from the slot cache and exists for display only.
pub struct AvailabilityCalculator {
    store: Arc<ReservationStore>,
    venue: VenueConfig,
    cache: SlotCache,
    counters: Counters,
}

impl AvailabilityCalculator {
    pub fn new(
        store: Arc<ReservationStore>,
        venue: VenueConfig,
        cache_ttl: Duration,
        counters: Counters,
    ) -> Self {
        Self {
            store,
            venue,
            cache: SlotCache::new(cache_ttl),
            counters,
        }
    }

    pub fn venue(&self) -> &VenueConfig {
        &self.venue
    }

    /// Fresh slot derivation for `date` from the store.
    #[instrument(skip(self), target = "availability", fields(%date))]
    pub async fn compute_slots(&self, date: NaiveDate, params: SlotParams) -> Result<SlotMap, AppError> {
        let reservations = self.store.reservations_on(date).await?;
        let report = slots::compute_slots(date, &reservations, &self.venue, params)?;
        self.record_clamps(report.clamped);

        debug!(
            reservations = reservations.len(),
            bookable = report.slots.len(),
            clamped = report.clamped,
            "slots computed"
        );
        Ok(report.slots)
    }

    /// Remaining venue-default capacity at `start`, derived from `reservations`
    /// as already read by the caller. 0 when `start` is not a bookable slot.
    pub fn remaining_at(
        &self,
        date: NaiveDate,
        reservations: &[Reservation],
        start: NaiveTime,
    ) -> Result<u32, AppError> {
        let report = slots::compute_slots(date, reservations, &self.venue, SlotParams::default())?;
        self.record_clamps(report.clamped);
        Ok(report.slots.get(&start).copied().unwrap_or(0))
    }

    fn record_clamps(&self, clamped: u64) {
        if clamped > 0 {
            Counters::add(&self.counters.overbook_clamps, clamped);
        }
    }

    /// Venue-default slots for display, served from the cache when fresh.
    #[instrument(skip(self), target = "availability", fields(%date))]
    pub async fn available_slots(&self, date: NaiveDate) -> Result<SlotMap, AppError> {
        if let Some(hit) = self.cache.get(date) {
            Counters::incr(&self.counters.slot_cache_hits);
            debug!("slot cache hit");
            return Ok(hit);
        }
        Counters::incr(&self.counters.slot_cache_misses);

        let seen = self.cache.generation(date);
        let fresh = self.compute_slots(date, SlotParams::default()).await?;
        if !self.cache.put(date, fresh.clone(), seen) {
            debug!("slot map superseded by a write; not cached");
        }
        Ok(fresh)
    }

    /// Drops any cached view of `date`. Called after every write.
    pub fn invalidate(&self, date: NaiveDate) {
        self.cache.invalidate(date);
    }
}
