use std::sync::Arc;

use crate::availability::AvailabilityCalculator;
use crate::booking::BookingCoordinator;
use crate::config::VenueConfig;
use crate::metrics::counters::Counters;

/// Handles shared by every request. Built once at bootstrap.
#[derive(Clone)]
pub struct AppState {
    pub calculator: Arc<AvailabilityCalculator>,
    pub coordinator: Arc<BookingCoordinator>,
    pub counters: Counters,
}

impl AppState {
    pub fn new(
        calculator: Arc<AvailabilityCalculator>,
        coordinator: Arc<BookingCoordinator>,
        counters: Counters,
    ) -> Self {
        Self {
            calculator,
            coordinator,
            counters,
        }
    }

    pub fn venue(&self) -> &VenueConfig {
        self.calculator.venue()
    }
}
