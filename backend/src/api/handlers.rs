use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::api::error::ApiError;
use crate::api::form::ReservationForm;
use crate::api::state::AppState;
use crate::booking::{BookingOutcome, RejectReason};
use crate::logger::annotate_span;
use crate::metrics::counters::Counters;
use crate::time::{fmt_time, parse_date, parse_time};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub time: Option<String>,
}

/// `GET /get_available_slots/{date}[?time=HH:MM]`
///
/// Without `time`: `{"slots": ["17:00", ...]}` listing bookable slots.
/// With `time`: `{"17:00": 5}`; 0 when that time cannot be booked.
pub async fn get_available_slots(
    State(state): State<AppState>,
    Path(raw_date): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, ApiError> {
    let date = parse_date(&raw_date)?;
    annotate_span(date, None);

    let wanted = query
        .time
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(parse_time)
        .transpose()?;

    let slots = state.calculator.available_slots(date).await?;

    let body = match wanted {
        Some(t) => {
            let mut single = Map::new();
            single.insert(fmt_time(t), json!(slots.get(&t).copied().unwrap_or(0)));
            Value::Object(single)
        }
        None => {
            let times: Vec<String> = slots.keys().map(|t| fmt_time(*t)).collect();
            json!({ "slots": times })
        }
    };

    Ok(Json(body))
}

/// `POST /reservations` with a form-encoded body.
pub async fn create_reservation(
    State(state): State<AppState>,
    Form(form): Form<ReservationForm>,
) -> Result<Response, ApiError> {
    let request = match form.validate(state.venue()) {
        Ok(r) => r,
        Err(errors) => {
            tracing::info!(target: "api", fields = ?errors.keys().collect::<Vec<_>>(), "form rejected");
            let body = json!({
                "message": "Invalid form data. Please correct the highlighted fields.",
                "errors": errors,
                "is_valid": false,
            });
            return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
        }
    };
    annotate_span(request.date, None);

    let outcome = state.coordinator.attempt_booking(request).await?;

    let response = match outcome {
        BookingOutcome::Confirmed {
            reservation,
            message,
        } => {
            annotate_span(reservation.date, Some(reservation.id));
            (
                StatusCode::OK,
                Json(json!({ "message": message, "is_valid": true })),
            )
        }
        BookingOutcome::Rejected(reason) => {
            let status = match reason {
                RejectReason::SlotUnavailable => StatusCode::CONFLICT,
                RejectReason::EmptyParty
                | RejectReason::PartyTooLarge { .. }
                | RejectReason::OutsideOperatingHours => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (
                status,
                Json(json!({ "message": reason.to_string(), "is_valid": false })),
            )
        }
    };

    Ok(response.into_response())
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "bookings_confirmed": Counters::read(&state.counters.bookings_confirmed),
        "bookings_rejected": Counters::read(&state.counters.bookings_rejected),
        "overbook_clamps": Counters::read(&state.counters.overbook_clamps),
    }))
}
