use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;

pub type ReservationId = i64;

/// A committed booking. Immutable once stored; it can only be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub id: ReservationId,

    // Guest
    pub name: String,
    pub email: String,
    pub party_size: u32,

    // When
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,

    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Occupied interval as minutes after midnight, half-open `[start, end)`.
    ///
    /// The end may exceed 24h for a late booking; it is never wrapped.
    pub fn occupied_minutes(&self) -> (u32, u32) {
        let start = minute_of_day(self.start_time);
        (start, start + self.duration_minutes)
    }

    /// True when a slot starting at `slot_start` falls inside the reservation.
    pub fn covers(&self, slot_start: NaiveTime) -> bool {
        let (start, end) = self.occupied_minutes();
        let m = minute_of_day(slot_start);
        m >= start && m < end
    }
}

/// Field set handed to the store; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub name: String,
    pub email: String,
    pub party_size: u32,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            name: self.name,
            email: self.email,
            party_size: self.party_size,
            date: self.date,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            created_at: self.created_at,
        }
    }
}

pub fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}
