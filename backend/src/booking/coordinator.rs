//! Booking coordinator.
//!
//! Protocol per request:
//! RECEIVED -> VALIDATED -> SLOT_CHECKED -> {COMMITTED | REJECTED}
//!
//! - Availability is recomputed from the store at commit time; neither a
//!   client snapshot nor the slot cache is trusted.
//! - The recompute and the insert are one guarded store write, serialized by
//!   the database across every process sharing it.
//! - Within one process a per-date lock queues same-date requests first.
//! - A rejection is terminal. Nothing is retried here.

use std::sync::Arc;

use tracing::{Span, debug, field, info, instrument, warn};

use crate::availability::AvailabilityCalculator;
use crate::booking::locks::DateLocks;
use crate::booking::types::{BookingOutcome, BookingRequest, BookingState, RejectReason};
use crate::error::AppError;
use crate::metrics::counters::Counters;
use crate::reservation::model::{NewReservation, Reservation};
use crate::reservation::store::ReservationStore;
use crate::time::now_utc;

pub struct BookingCoordinator {
    calculator: Arc<AvailabilityCalculator>,
    store: Arc<ReservationStore>,
    locks: DateLocks,
    counters: Counters,
}

impl BookingCoordinator {
    pub fn new(
        calculator: Arc<AvailabilityCalculator>,
        store: Arc<ReservationStore>,
        counters: Counters,
    ) -> Self {
        Self {
            calculator,
            store,
            locks: DateLocks::new(),
            counters,
        }
    }

    /// Runs one booking attempt to a terminal state.
    ///
    /// `Ok(Rejected(..))` is a business outcome and performs no write.
    /// `Err` means the store failed; nothing is visible to readers then.
    #[instrument(
        skip(self, request),
        target = "booking",
        fields(
            date = %request.date,
            start_time = %request.start_time.format("%H:%M"),
            party_size = request.party_size,
            state = %BookingState::Received,
            reservation_id = field::Empty
        )
    )]
    pub async fn attempt_booking(&self, request: BookingRequest) -> Result<BookingOutcome, AppError> {
        debug!("booking request received");

        if let Some(reason) = self.check_request(&request) {
            return Ok(self.reject(reason));
        }
        advance(BookingState::Validated);

        // In-process fast path: same-date requests queue here instead of on
        // the database write lock.
        let _date_guard = self.locks.acquire(request.date).await;

        let new = NewReservation {
            name: request.name,
            email: request.email,
            party_size: request.party_size,
            date: request.date,
            start_time: request.start_time,
            duration_minutes: self.calculator.venue().default_duration_minutes,
            created_at: now_utc(),
        };

        let calculator = &self.calculator;
        let admit = |existing: &[Reservation]| -> anyhow::Result<bool> {
            let remaining = calculator.remaining_at(new.date, existing, new.start_time)?;
            debug!(remaining, "capacity rechecked inside write transaction");
            Ok(remaining > 0)
        };

        let stored = self.store.insert_if_admitted(&new, &admit).await?;
        advance(BookingState::SlotChecked);

        let Some(stored) = stored else {
            return Ok(self.reject(RejectReason::SlotUnavailable));
        };
        self.calculator.invalidate(stored.date);

        advance(BookingState::Committed);
        Span::current().record("reservation_id", stored.id);
        Counters::incr(&self.counters.bookings_confirmed);
        info!("booking committed");

        Ok(BookingOutcome::confirmed(stored))
    }

    /// Deletes a committed reservation and drops the cached view of its date.
    #[instrument(skip(self), target = "booking")]
    pub async fn cancel(&self, reservation_id: i64) -> Result<(), AppError> {
        let Some(existing) = self.store.load_by_id(reservation_id).await? else {
            return Err(AppError::NotFound(reservation_id));
        };

        let _date_guard = self.locks.acquire(existing.date).await;
        if !self.store.delete(reservation_id).await? {
            return Err(AppError::NotFound(reservation_id));
        }
        self.calculator.invalidate(existing.date);

        info!(date = %existing.date, "reservation cancelled");
        Ok(())
    }

    /// Semantic checks owned by the core. Shape was checked at the boundary.
    fn check_request(&self, request: &BookingRequest) -> Option<RejectReason> {
        let venue = self.calculator.venue();

        if request.party_size == 0 {
            return Some(RejectReason::EmptyParty);
        }
        if request.party_size > venue.max_party_size {
            return Some(RejectReason::PartyTooLarge {
                max: venue.max_party_size,
            });
        }
        if !venue.is_open_at(request.start_time) {
            return Some(RejectReason::OutsideOperatingHours);
        }
        None
    }

    fn reject(&self, reason: RejectReason) -> BookingOutcome {
        advance(BookingState::Rejected);
        Counters::incr(&self.counters.bookings_rejected);
        warn!(%reason, "booking rejected");
        BookingOutcome::Rejected(reason)
    }
}

fn advance(state: BookingState) {
    Span::current().record("state", field::display(state));
    debug!(%state, "booking state advanced");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::SlotParams;
    use crate::config::VenueConfig;
    use crate::reservation::mock::{MockReservationRepository, new_reservation};
    use chrono::{NaiveDate, NaiveTime};
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 5).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn request(h: u32, m: u32) -> BookingRequest {
        BookingRequest {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            party_size: 2,
            date: day(),
            start_time: t(h, m),
        }
    }

    struct Harness {
        repo: Arc<MockReservationRepository>,
        calc: Arc<AvailabilityCalculator>,
        coordinator: Arc<BookingCoordinator>,
        counters: Counters,
    }

    fn harness_with(repo: MockReservationRepository, cache_ttl: Duration) -> Harness {
        let repo = Arc::new(repo);
        let store = Arc::new(ReservationStore::new(repo.clone()));
        let counters = Counters::default();
        let calc = Arc::new(AvailabilityCalculator::new(
            store.clone(),
            VenueConfig::default(),
            cache_ttl,
            counters.clone(),
        ));
        let coordinator = Arc::new(BookingCoordinator::new(
            calc.clone(),
            store,
            counters.clone(),
        ));
        Harness {
            repo,
            calc,
            coordinator,
            counters,
        }
    }

    fn harness() -> Harness {
        harness_with(MockReservationRepository::default(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn booking_with_capacity_commits_and_decrements() {
        let h = harness();
        h.repo.seed([new_reservation(day(), 17, 0)]);

        let outcome = h.coordinator.attempt_booking(request(17, 0)).await.unwrap();

        let BookingOutcome::Confirmed {
            reservation,
            message,
        } = outcome
        else {
            panic!("expected confirmation");
        };
        assert_eq!(reservation.start_time, t(17, 0));
        assert_eq!(reservation.duration_minutes, 60);
        assert!(message.contains("successfully added John Doe"));

        let slots = h.calc.compute_slots(day(), SlotParams::default()).await.unwrap();
        assert_eq!(slots[&t(17, 0)], 4);
        assert_eq!(slots[&t(17, 30)], 4);
        assert_eq!(slots[&t(18, 0)], 6);
        assert_eq!(Counters::read(&h.counters.bookings_confirmed), 1);
    }

    #[tokio::test]
    async fn full_slot_is_rejected_without_write() {
        let h = harness();
        h.repo.seed((0..6).map(|_| new_reservation(day(), 17, 0)));
        let calls_before = *h.repo.insert_calls.lock();

        let outcome = h.coordinator.attempt_booking(request(17, 0)).await.unwrap();

        assert_eq!(outcome, BookingOutcome::Rejected(RejectReason::SlotUnavailable));
        assert_eq!(h.repo.len(), 6);
        assert_eq!(*h.repo.insert_calls.lock(), calls_before);
        assert_eq!(Counters::read(&h.counters.bookings_rejected), 1);
    }

    #[tokio::test]
    async fn off_grid_time_is_unavailable() {
        let h = harness();

        let outcome = h.coordinator.attempt_booking(request(17, 10)).await.unwrap();

        assert_eq!(outcome, BookingOutcome::Rejected(RejectReason::SlotUnavailable));
        assert_eq!(h.repo.len(), 0);
    }

    #[tokio::test]
    async fn outside_hours_is_rejected_before_slot_check() {
        let h = harness();

        let early = h.coordinator.attempt_booking(request(16, 30)).await.unwrap();
        let closing = h.coordinator.attempt_booking(request(23, 0)).await.unwrap();

        assert_eq!(early, BookingOutcome::Rejected(RejectReason::OutsideOperatingHours));
        assert_eq!(closing, BookingOutcome::Rejected(RejectReason::OutsideOperatingHours));
        assert_eq!(*h.repo.insert_calls.lock(), 0);
    }

    #[tokio::test]
    async fn oversized_party_is_rejected() {
        let h = harness();
        let mut req = request(18, 0);
        req.party_size = 7;

        let outcome = h.coordinator.attempt_booking(req).await.unwrap();

        assert_eq!(
            outcome,
            BookingOutcome::Rejected(RejectReason::PartyTooLarge { max: 6 })
        );
    }

    #[tokio::test]
    async fn empty_party_is_not_reported_as_too_large() {
        let h = harness();
        let mut req = request(18, 0);
        req.party_size = 0;

        let outcome = h.coordinator.attempt_booking(req).await.unwrap();

        assert_eq!(outcome, BookingOutcome::Rejected(RejectReason::EmptyParty));
        assert_eq!(*h.repo.insert_calls.lock(), 0);
    }

    #[tokio::test]
    async fn stale_cache_never_decides_a_commit() {
        let h = harness();

        // Cache shows 17:00 open
        let shown = h.calc.available_slots(day()).await.unwrap();
        assert_eq!(shown[&t(17, 0)], 6);

        // Slot fills behind the cache's back
        h.repo.seed((0..6).map(|_| new_reservation(day(), 17, 0)));

        let outcome = h.coordinator.attempt_booking(request(17, 0)).await.unwrap();
        assert_eq!(outcome, BookingOutcome::Rejected(RejectReason::SlotUnavailable));
    }

    #[tokio::test]
    async fn successful_booking_invalidates_display_cache() {
        let h = harness();
        h.calc.available_slots(day()).await.unwrap();

        h.coordinator.attempt_booking(request(17, 0)).await.unwrap();

        let shown = h.calc.available_slots(day()).await.unwrap();
        assert_eq!(shown[&t(17, 0)], 5);
    }

    #[tokio::test]
    async fn persistence_failure_propagates() {
        let h = harness_with(MockReservationRepository::failing_inserts(), Duration::ZERO);

        let err = h.coordinator.attempt_booking(request(17, 0)).await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(h.repo.len(), 0);
        assert_eq!(Counters::read(&h.counters.bookings_confirmed), 0);
    }

    #[tokio::test]
    async fn store_offline_fails_before_slot_check() {
        let h = harness_with(MockReservationRepository::failing(), Duration::ZERO);

        let err = h.coordinator.attempt_booking(request(17, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(*h.repo.insert_calls.lock(), 0);
    }

    // The mock interleaves reads and writes, so only the date lock keeps
    // this at the table count.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_never_exceed_table_count() {
        let h = harness();
        let mut set = JoinSet::new();

        for _ in 0..20 {
            let c = Arc::clone(&h.coordinator);
            set.spawn(async move { c.attempt_booking(request(19, 0)).await });
        }

        let mut confirmed = 0;
        while let Some(res) = set.join_next().await {
            let outcome = res.expect("Task panicked").expect("booking failed");
            if outcome.is_confirmed() {
                confirmed += 1;
            }
        }

        assert_eq!(confirmed, 6);
        assert_eq!(h.repo.len(), 6);
        let slots = h.calc.compute_slots(day(), SlotParams::default()).await.unwrap();
        assert!(!slots.contains_key(&t(19, 0)));
    }

    #[tokio::test]
    async fn cancel_frees_the_table() {
        let h = harness();
        let BookingOutcome::Confirmed { reservation, .. } =
            h.coordinator.attempt_booking(request(20, 0)).await.unwrap()
        else {
            panic!("expected confirmation");
        };

        h.coordinator.cancel(reservation.id).await.unwrap();

        let slots = h.calc.available_slots(day()).await.unwrap();
        assert_eq!(slots[&t(20, 0)], 6);
        assert!(matches!(
            h.coordinator.cancel(reservation.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
