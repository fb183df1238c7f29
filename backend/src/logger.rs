use std::time::Duration;

use chrono::NaiveDate;
use common::TraceId;
use tracing::{Span, field};

/// Root span for one inbound HTTP request.
pub fn request_span(method: &str, path: &str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "request",
        method = %method,
        path = %path,
        trace_id = %trace_id.as_str(),
        date = field::Empty,
        reservation_id = field::Empty
    )
}

/// Records the business keys on the current span once they are known.
pub fn annotate_span(date: NaiveDate, reservation_id: Option<i64>) {
    let span = Span::current();
    span.record("date", field::display(date));
    if let Some(id) = reservation_id {
        span.record("reservation_id", id);
    }
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
