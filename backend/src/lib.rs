pub mod api;
pub mod availability;
pub mod booking;
pub mod config;
pub mod db;
pub mod metrics;
pub mod reservation;

pub mod error;
pub mod logger;
pub mod time;
