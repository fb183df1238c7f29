use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::AppError;
use crate::time::parse_time;

/// Static parameters of the dining room.
///
/// Read-only for the availability calculator and the booking coordinator;
/// owned by bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VenueConfig {
    /// Total number of interchangeable tables.
    pub table_count: u32,

    /// First bookable slot start (inclusive).
    pub opening_time: NaiveTime,

    /// End of the operating window (exclusive for slot starts).
    pub closing_time: NaiveTime,

    /// Width of a bookable slot.
    pub slot_interval_minutes: u32,

    /// Largest party accepted by the booking form.
    pub max_party_size: u32,

    /// Length of a reservation when the request does not say otherwise.
    /// Stored in minutes so fractional hours survive.
    pub default_duration_minutes: u32,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            table_count: 6,
            opening_time: hm(17, 0),
            closing_time: hm(23, 0),
            slot_interval_minutes: 30,
            max_party_size: 6,
            default_duration_minutes: 60,
        }
    }
}

impl VenueConfig {
    /// Rejects configurations the calculator cannot produce slots for.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.table_count == 0 {
            return Err(AppError::InvalidConfig("table_count must be positive".into()));
        }
        if self.slot_interval_minutes == 0 {
            return Err(AppError::InvalidConfig(
                "slot_interval_minutes must be positive".into(),
            ));
        }
        if self.closing_time <= self.opening_time {
            return Err(AppError::InvalidConfig(format!(
                "closing_time {} must be after opening_time {}",
                self.closing_time.format("%H:%M"),
                self.opening_time.format("%H:%M")
            )));
        }
        if self.max_party_size == 0 {
            return Err(AppError::InvalidConfig("max_party_size must be positive".into()));
        }
        if self.default_duration_minutes == 0 {
            return Err(AppError::InvalidConfig(
                "default duration must be positive".into(),
            ));
        }
        Ok(())
    }

    /// True when `t` lies in `[opening_time, closing_time)`.
    pub fn is_open_at(&self, t: NaiveTime) -> bool {
        t >= self.opening_time && t < self.closing_time
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,

    pub venue: VenueConfig,

    /// How long a computed slot map may be served to availability queries.
    ///
    /// Only the read path consults the cache; bookings always recompute.
    /// A zero TTL disables caching.
    pub slot_cache_ttl: Duration,
}

impl AppConfig {
    /// Builds the configuration from the process environment (and `.env`).
    ///
    /// Unset variables fall back to defaults; set-but-unparseable ones are errors.
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://reservations.db?mode=rwc".to_string());

        let bind_addr = env_or("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?;

        let defaults = VenueConfig::default();
        let default_hours = f64::from(defaults.default_duration_minutes) / 60.0;
        let duration_hours: f64 = env_or("VENUE_DEFAULT_DURATION_HOURS", default_hours)?;
        if !(duration_hours.is_finite() && duration_hours > 0.0) {
            return Err(AppError::InvalidConfig(format!(
                "VENUE_DEFAULT_DURATION_HOURS must be positive, got {duration_hours}"
            )));
        }

        let venue = VenueConfig {
            table_count: env_or("VENUE_TABLE_COUNT", defaults.table_count)?,
            opening_time: env_time_or("VENUE_OPENING_TIME", defaults.opening_time)?,
            closing_time: env_time_or("VENUE_CLOSING_TIME", defaults.closing_time)?,
            slot_interval_minutes: env_or(
                "VENUE_SLOT_INTERVAL_MINUTES",
                defaults.slot_interval_minutes,
            )?,
            max_party_size: env_or("VENUE_MAX_PARTY_SIZE", defaults.max_party_size)?,
            default_duration_minutes: (duration_hours * 60.0).round() as u32,
        };
        venue.validate()?;

        let slot_cache_ttl = Duration::from_secs(env_or("SLOT_CACHE_TTL_SECS", 5u64)?);

        Ok(Self {
            database_url,
            bind_addr,
            venue,
            slot_cache_ttl,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::InvalidConfig(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_time_or(key: &str, default: NaiveTime) -> Result<NaiveTime, AppError> {
    match std::env::var(key) {
        Ok(raw) => parse_time(raw.trim())
            .map_err(|e| AppError::InvalidConfig(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}
