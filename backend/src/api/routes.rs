use axum::{
    Router,
    extract::Request,
    routing::{get, post},
};
use common::TraceId;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api::handlers::{create_reservation, get_available_slots, health};
use crate::api::state::AppState;
use crate::logger::request_span;

/// Build the complete router with request tracing.
///
/// Every request gets a root span carrying a fresh `TraceId`; handlers add
/// the date and reservation id to it once known.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/get_available_slots/:date", get(get_available_slots))
        .route("/reservations", post(create_reservation))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    request_span(
                        req.method().as_str(),
                        req.uri().path(),
                        &TraceId::default(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(state)
}
