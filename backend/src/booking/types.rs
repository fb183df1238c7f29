use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use crate::reservation::model::Reservation;
use crate::time::{fmt_date, fmt_time};

/// Booking input after boundary validation: every field is well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub party_size: u32,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

/// Progress of one booking attempt. `Committed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    Received,
    Validated,
    SlotChecked,
    Committed,
    Rejected,
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingState::Received => "RECEIVED",
            BookingState::Validated => "VALIDATED",
            BookingState::SlotChecked => "SLOT_CHECKED",
            BookingState::Committed => "COMMITTED",
            BookingState::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Slot full or gone between display and submit. Caller must re-query.
    SlotUnavailable,
    /// Party of zero guests.
    EmptyParty,
    PartyTooLarge { max: u32 },
    OutsideOperatingHours,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SlotUnavailable => {
                f.write_str("Selected time slot is no longer available.")
            }
            RejectReason::EmptyParty => f.write_str("A reservation needs at least one guest."),
            RejectReason::PartyTooLarge { max } => {
                write!(f, "Parties larger than {max} cannot be booked online.")
            }
            RejectReason::OutsideOperatingHours => {
                f.write_str("Selected time is outside opening hours.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed {
        reservation: Reservation,
        message: String,
    },
    Rejected(RejectReason),
}

impl BookingOutcome {
    pub fn confirmed(reservation: Reservation) -> Self {
        let message = confirmation_message(&reservation);
        BookingOutcome::Confirmed {
            reservation,
            message,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingOutcome::Confirmed { .. })
    }
}

pub fn confirmation_message(r: &Reservation) -> String {
    format!(
        "Your reservation for {} people on {} at {} has been successfully added {}. \
         If any issues arise, we will contact you at {}.",
        r.party_size,
        fmt_date(r.date),
        fmt_time(r.start_time),
        r.name,
        r.email
    )
}
