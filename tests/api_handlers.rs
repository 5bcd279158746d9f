use std::sync::Arc;
use std::time::Duration;

use bookingBot::config::SlotSettings;
use bookingBot::error::{BookingError, Result};
use bookingBot::handlers::api::{self, SlotsQuery};
use bookingBot::models::booking::{BookBody, BookingResult, BusyInterval, EventRequest};
use bookingBot::service::booking_service::BookingService;
use bookingBot::service::calendar_gateway::CalendarGateway;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use warp::http::StatusCode;

struct FixedGateway {
    busy: Vec<BusyInterval>,
    outage: Option<BookingError>,
}

#[serenity::async_trait]
impl CalendarGateway for FixedGateway {
    async fn create_event(&self, _request: &EventRequest, _time_zone: &Tz) -> Result<BookingResult> {
        if let Some(err) = &self.outage {
            return Err(err.clone());
        }
        Ok(BookingResult {
            event_id: "abc123".to_string(),
            event_link: "https://calendar.google.com/event?eid=abc123".to_string(),
        })
    }

    async fn list_events(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        if let Some(err) = &self.outage {
            return Err(err.clone());
        }
        Ok(self.busy.clone())
    }
}

fn service(busy: Vec<BusyInterval>, outage: Option<BookingError>) -> BookingService {
    let settings = SlotSettings {
        timezone: chrono_tz::UTC,
        ..SlotSettings::default()
    };
    BookingService::new(Arc::new(FixedGateway { busy, outage }), settings)
}

fn body(summary: &str, start: &str, end: &str) -> BookBody {
    BookBody {
        summary: summary.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

#[tokio::test]
async fn book_returns_success_payload() {
    let svc = service(vec![], None);
    let response = api::book(&svc, body("Sync", "2025-07-04T10:00:00", "2025-07-04T11:00:00"))
        .await
        .unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.event_id, "abc123");
    assert_eq!(response.event_link, "https://calendar.google.com/event?eid=abc123");
}

#[tokio::test]
async fn book_validation_errors_are_bad_requests() {
    let svc = service(vec![], None);
    let err = api::book(&svc, body("", "2025-07-04T10:00:00", "2025-07-04T11:00:00"))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::EmptyTitle);
    assert_eq!(api::status_for(&err), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gateway_errors_map_to_5xx() {
    let svc = service(vec![], Some(BookingError::GatewayUnavailable("boom".into())));
    let err = api::book(&svc, body("Sync", "2025-07-04T10:00:00", "2025-07-04T11:00:00"))
        .await
        .unwrap_err();
    assert_eq!(api::status_for(&err), StatusCode::BAD_GATEWAY);
    assert_eq!(
        api::status_for(&BookingError::GatewayTimeout(Duration::from_secs(3))),
        StatusCode::GATEWAY_TIMEOUT
    );
}

#[tokio::test]
async fn dated_slots_cover_working_hours() {
    let at = |h: u32| Utc.with_ymd_and_hms(2025, 7, 4, h, 0, 0).unwrap();
    let svc = service(
        vec![
            BusyInterval::new(at(9), at(10)).unwrap(),
            BusyInterval::new(at(13), at(14)).unwrap(),
        ],
        None,
    );
    let response = api::slots(
        &svc,
        SlotsQuery {
            date: Some("2025-07-04".to_string()),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    assert_eq!(
        response.available_slots,
        vec![
            "10:00 AM to 11:00 AM",
            "11:00 AM to 12:00 PM",
            "12:00 PM to 01:00 PM",
            "02:00 PM to 03:00 PM",
            "03:00 PM to 04:00 PM",
            "04:00 PM to 05:00 PM",
        ]
    );
}

#[tokio::test]
async fn undated_slots_start_from_now() {
    let svc = service(vec![], None);
    let now = Utc.with_ymd_and_hms(2025, 7, 4, 22, 5, 0).unwrap();
    let response = api::slots(&svc, SlotsQuery::default(), now).await.unwrap();
    assert_eq!(response.available_slots, vec!["11:00 PM to 12:00 AM"]);
}

#[tokio::test]
async fn bad_date_query_is_rejected() {
    let svc = service(vec![], None);
    let err = api::slots(
        &svc,
        SlotsQuery {
            date: Some("July 4th".to_string()),
        },
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BookingError::MalformedTimestamp { field: "date", .. }));
    assert_eq!(api::status_for(&err), StatusCode::BAD_REQUEST);
}
