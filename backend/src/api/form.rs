use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::booking::BookingRequest;
use crate::config::VenueConfig;
use crate::time::{parse_date, parse_time};

const NAME_MAX_LEN: usize = 100;
const EMAIL_MAX_LEN: usize = 120;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|e| panic!("email pattern: {e}"))
});

/// Field name → reason.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Raw form body. Every field is optional text so missing and malformed
/// values can be reported per field instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ReservationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub num_people: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

impl ReservationForm {
    /// Checks field shape and converts into the coordinator's input.
    pub fn validate(&self, venue: &VenueConfig) -> Result<BookingRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name", "This field is required.".into());
        } else if name.chars().count() > NAME_MAX_LEN {
            errors.insert("name", format!("Must be at most {NAME_MAX_LEN} characters."));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "This field is required.".into());
        } else if email.len() > EMAIL_MAX_LEN || !EMAIL_SHAPE.is_match(email) {
            errors.insert("email", "email is invalid".into());
        }

        let party_size = match self.num_people.trim() {
            "" => {
                errors.insert("num_people", "This field is required.".into());
                None
            }
            raw => match raw.parse::<u32>() {
                Ok(n) if (1..=venue.max_party_size).contains(&n) => Some(n),
                _ if raw.parse::<i64>().is_ok() => {
                    errors.insert(
                        "num_people",
                        format!("Number must be between 1 and {}.", venue.max_party_size),
                    );
                    None
                }
                _ => {
                    errors.insert("num_people", "Not a valid integer value.".into());
                    None
                }
            },
        };

        let date = match self.date.trim() {
            "" => {
                errors.insert("date", "This field is required.".into());
                None
            }
            raw => match parse_date(raw) {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.insert("date", "Not a valid date value.".into());
                    None
                }
            },
        };

        let start_time = match self.time.trim() {
            "" => {
                errors.insert("time", "This field is required.".into());
                None
            }
            raw => match parse_time(raw) {
                Ok(t) => Some(t),
                Err(_) => {
                    errors.insert("time", "Not a valid time value.".into());
                    None
                }
            },
        };

        match (party_size, date, start_time) {
            (Some(party_size), Some(date), Some(start_time)) if errors.is_empty() => {
                Ok(BookingRequest {
                    name: name.to_string(),
                    email: email.to_string(),
                    party_size,
                    date,
                    start_time,
                })
            }
            _ => Err(errors),
        }
    }
}
