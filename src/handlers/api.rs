use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::error::BookingError;
use crate::models::booking::{BookBody, BookResponse, ErrorMessage, SlotsResponse};
use crate::service::booking_service::BookingService;

const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
}

/// Validates and books the event described by `body`.
pub async fn book(booking: &BookingService, body: BookBody) -> Result<BookResponse, BookingError> {
    let result = booking
        .book_raw(&body.summary, &body.start_time, &body.end_time)
        .await?;
    Ok(BookResponse {
        status: "success".to_string(),
        event_link: result.event_link,
        event_id: result.event_id,
    })
}

/// Free slots for the rest of today, or for the working hours of `query.date`.
pub async fn slots(
    booking: &BookingService,
    query: SlotsQuery,
    now: DateTime<Utc>,
) -> Result<SlotsResponse, BookingError> {
    let day = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            BookingError::MalformedTimestamp {
                field: "date",
                value: raw.to_string(),
            }
        })?),
        None => None,
    };
    let available_slots = booking.slot_labels(day, now).await?;
    Ok(SlotsResponse { available_slots })
}

pub fn status_for(err: &BookingError) -> StatusCode {
    match err {
        BookingError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        BookingError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_REQUEST,
    }
}

pub fn error_body(err: &BookingError) -> ErrorMessage {
    let (field, value) = match err {
        BookingError::MalformedTimestamp { field, value } => {
            (Some(field.to_string()), Some(value.clone()))
        }
        _ => (None, None),
    };
    ErrorMessage {
        error: err.to_string(),
        kind: err.kind().to_string(),
        field,
        value,
    }
}

fn respond<T: Serialize>(result: Result<T, BookingError>) -> WithStatus<Json> {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), StatusCode::OK),
        Err(err) => {
            if err.is_validation() {
                tracing::info!(kind = err.kind(), "request rejected");
            } else {
                tracing::error!(kind = err.kind(), error = %err, "calendar call failed");
            }
            warp::reply::with_status(warp::reply::json(&error_body(&err)), status_for(&err))
        }
    }
}

async fn handle_book(booking: Arc<BookingService>, body: BookBody) -> Result<WithStatus<Json>, Infallible> {
    tracing::debug!(summary = %body.summary, "POST /book");
    Ok(respond(book(&booking, body).await))
}

async fn handle_slots(booking: Arc<BookingService>, query: SlotsQuery) -> Result<WithStatus<Json>, Infallible> {
    tracing::debug!(date = ?query.date, "GET slots");
    Ok(respond(slots(&booking, query, Utc::now()).await))
}

/// Status and client-facing text for a request warp refused before it reached a handler.
fn rejection_reply(err: &Rejection) -> (StatusCode, String) {
    if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("invalid request body: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected an application/json body".to_string(),
        )
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid query string".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::warn!(rejection = ?err, "unhandled rejection");
        (StatusCode::BAD_REQUEST, "bad request".to_string())
    }
}

async fn handle_rejection(err: Rejection) -> Result<WithStatus<Json>, Infallible> {
    let (status, message) = rejection_reply(&err);
    let body = ErrorMessage {
        error: message,
        kind: "BadRequest".to_string(),
        field: None,
        value: None,
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

pub fn routes(
    booking: Arc<BookingService>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_booking = warp::any().map(move || booking.clone());

    let root = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "message": "Calendar Bot is running 🚀" })));

    let book = warp::path("book")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_booking.clone())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and_then(handle_book);

    let available = warp::path("available")
        .or(warp::path("slots"))
        .unify()
        .and(warp::path::end())
        .and(warp::get())
        .and(with_booking)
        .and(warp::query::<SlotsQuery>())
        .and_then(handle_slots);

    root.or(book).or(available).recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unexpected;

    impl warp::reject::Reject for Unexpected {}

    #[test]
    fn unknown_rejections_get_a_fixed_message() {
        let (status, message) = rejection_reply(&warp::reject::custom(Unexpected));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "bad request");
        assert!(!message.contains("Unexpected"));
    }

    #[test]
    fn missing_route_is_not_found() {
        let (status, _) = rejection_reply(&warp::reject::not_found());
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_timestamp_body_names_the_field() {
        let body = error_body(&BookingError::MalformedTimestamp {
            field: "start",
            value: "soon".to_string(),
        });
        assert_eq!(body.kind, "MalformedTimestamp");
        assert_eq!(body.field.as_deref(), Some("start"));
        assert_eq!(body.value.as_deref(), Some("soon"));
        assert!(error_body(&BookingError::EmptyTitle).field.is_none());
    }
}
