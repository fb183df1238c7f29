use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use tracing::warn;

use crate::config::VenueConfig;
use crate::error::AppError;
use crate::reservation::model::{Reservation, minute_of_day};

/// Bookable slot start → remaining tables. Chronological; every value ≥ 1.
pub type SlotMap = BTreeMap<NaiveTime, u32>;

/// Per-query overrides for what-if calculations. `None` uses the venue value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotParams {
    pub tables: Option<u32>,
    pub interval_minutes: Option<u32>,
}

impl SlotParams {
    /// Resolves to `(tables, interval_minutes)`.
    pub fn resolve(&self, venue: &VenueConfig) -> Result<(u32, u32), AppError> {
        let tables = self.tables.unwrap_or(venue.table_count);
        let interval = self.interval_minutes.unwrap_or(venue.slot_interval_minutes);
        if interval == 0 {
            return Err(AppError::InvalidConfig(
                "slot interval must be positive".into(),
            ));
        }
        Ok((tables, interval))
    }
}

/// Result of one slot derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotReport {
    pub slots: SlotMap,
    /// Decrements skipped because the slot was already at zero.
    pub clamped: u64,
}

/// Slot starts from opening (inclusive) to closing (exclusive).
///
/// When the window is not a multiple of the interval the last slot starts
/// less than one interval before closing.
pub fn slot_starts(venue: &VenueConfig, interval_minutes: u32) -> Vec<NaiveTime> {
    let open = minute_of_day(venue.opening_time);
    let close = minute_of_day(venue.closing_time);
    let step = interval_minutes.max(1) as usize;

    (open..close)
        .step_by(step)
        .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
        .collect()
}

/// Derives remaining capacity per slot for `date`.
///
/// Every slot starts at `tables`. Each reservation on `date` takes one table
/// from every slot whose start lies in its half-open occupied interval.
/// Decrements stop at zero; each one that would go below is counted in
/// `clamped` and logged, since it means more overlapping bookings than tables.
/// Slots left at zero are dropped from the result.
///
/// Reservation legality is not checked: bookings that start before opening
/// or run past closing still consume whatever in-window slots they overlap.
pub fn compute_slots(
    date: NaiveDate,
    reservations: &[Reservation],
    venue: &VenueConfig,
    params: SlotParams,
) -> Result<SlotReport, AppError> {
    let (tables, interval) = params.resolve(venue)?;

    let mut remaining: Vec<(NaiveTime, u32)> = slot_starts(venue, interval)
        .into_iter()
        .map(|t| (t, tables))
        .collect();

    let mut clamped = 0u64;

    for r in reservations.iter().filter(|r| r.date == date) {
        for (slot, left) in remaining.iter_mut() {
            if !r.covers(*slot) {
                continue;
            }
            if *left == 0 {
                clamped += 1;
                warn!(
                    target: "availability",
                    %date,
                    slot = %slot.format("%H:%M"),
                    reservation_id = r.id,
                    "overbooked slot detected; remaining capacity clamped at zero"
                );
                continue;
            }
            *left -= 1;
        }
    }

    let slots = remaining.into_iter().filter(|(_, left)| *left > 0).collect();

    Ok(SlotReport { slots, clamped })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::reservation::mock::new_reservation_for;
    use proptest::prelude::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 5).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn test_slot_invariants(
            tables in 1..=12u32,
            interval in prop::sample::select(vec![15u32, 30, 60]),
            // (slot index, duration in whole intervals)
            bookings in prop::collection::vec((0..24usize, 1..=6u32), 0..40)
        ) {
            let venue = VenueConfig { table_count: tables, ..VenueConfig::default() };
            let starts = slot_starts(&venue, interval);
            let reservations: Vec<Reservation> = bookings
                .iter()
                .enumerate()
                .map(|(i, (slot_idx, span))| {
                    let start = starts[slot_idx % starts.len()];
                    new_reservation_for(
                        day(),
                        minute_of_day(start) / 60,
                        minute_of_day(start) % 60,
                        span * interval,
                    )
                    .into_reservation(i as i64 + 1)
                })
                .collect();

            let params = SlotParams { tables: None, interval_minutes: Some(interval) };
            let report = compute_slots(day(), &reservations, &venue, params).unwrap();

            // --- INVARIANT 1: only bookable slots are reported ---
            prop_assert!(report.slots.values().all(|&n| n >= 1 && n <= tables));

            // --- INVARIANT 2: remaining = tables - overlapping, floored at zero ---
            for start in &starts {
                let overlapping = reservations.iter().filter(|r| r.covers(*start)).count() as u32;
                let expected = tables.saturating_sub(overlapping);
                prop_assert_eq!(report.slots.get(start).copied().unwrap_or(0), expected);
            }

            // --- INVARIANT 3: every key is a generated slot start ---
            prop_assert!(report.slots.keys().all(|k| starts.contains(k)));

            // --- INVARIANT 4: clamps account for every overflowing overlap ---
            let overflow: u64 = starts
                .iter()
                .map(|s| {
                    let n = reservations.iter().filter(|r| r.covers(*s)).count() as u32;
                    u64::from(n.saturating_sub(tables))
                })
                .sum();
            prop_assert_eq!(report.clamped, overflow);
        }

        #[test]
        fn test_single_booking_footprint(
            slot_idx in 0..12usize,
            hours in 1..=3u32,
        ) {
            let venue = VenueConfig::default();
            let starts = slot_starts(&venue, 30);
            let start = starts[slot_idx];
            let r = new_reservation_for(day(), minute_of_day(start) / 60, minute_of_day(start) % 60, hours * 60)
                .into_reservation(1);

            let report = compute_slots(day(), &[r], &venue, SlotParams::default()).unwrap();

            let decremented: Vec<_> = report.slots.iter().filter(|(_, n)| **n == 5).map(|(t, _)| *t).collect();
            let in_window = starts[slot_idx..].len().min((hours * 2) as usize);

            // d * 60 / interval slots affected, clipped at closing
            prop_assert_eq!(decremented.len(), in_window);
            prop_assert!(decremented.iter().all(|t| *t >= start));
            prop_assert_eq!(report.slots.len(), 12);
        }
    }
}
