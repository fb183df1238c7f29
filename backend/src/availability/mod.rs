//! Reservation availability engine.
//!
//! - `slots`: pure slot derivation from a day's reservations.
//! - `cache`: short-lived per-date cache for the read path only.
//! - `calculator`: binds the two to the reservation store.

pub mod cache;
pub mod calculator;
pub mod slots;

pub use calculator::AvailabilityCalculator;
pub use slots::{SlotMap, SlotParams, compute_slots};
