use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("reservation not found: {0}")]
    NotFound(i64),

    /// Store unreachable or a write failed. Never downgraded to a rejection.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}
