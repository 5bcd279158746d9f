use std::time::Duration;

use bookingBot::clients::google_calendar::GoogleCalendarClient;
use bookingBot::config::GoogleSettings;
use bookingBot::error::BookingError;
use bookingBot::models::booking::EventRequest;
use bookingBot::service::calendar_gateway::CalendarGateway;
use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use serde_json::json;

fn client(server: &MockServer, timeout: Duration) -> GoogleCalendarClient {
    GoogleCalendarClient::new(
        GoogleSettings {
            calendar_id: "primary".to_string(),
            access_token: "test-token".to_string(),
            api_base: server.base_url(),
        },
        timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn create_event_posts_local_times_and_returns_link() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/calendars/primary/events")
                .header("Authorization", "Bearer test-token")
                .body_contains("\"summary\":\"Team Sync\"")
                .body_contains("2025-07-04T10:00:00+05:30")
                .body_contains("Asia/Kolkata");
            then.status(200).json_body(json!({
                "id": "evt123",
                "htmlLink": "https://www.google.com/calendar/event?eid=evt123"
            }));
        })
        .await;

    let request = EventRequest {
        title: "Team Sync".to_string(),
        start: Utc.with_ymd_and_hms(2025, 7, 4, 4, 30, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 7, 4, 5, 30, 0).unwrap(),
    };
    let result = client(&server, Duration::from_secs(5))
        .create_event(&request, &chrono_tz::Asia::Kolkata)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.event_id, "evt123");
    assert_eq!(result.event_link, "https://www.google.com/calendar/event?eid=evt123");
}

#[tokio::test]
async fn list_events_skips_all_day_entries() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/calendars/primary/events")
                .query_param("singleEvents", "true")
                .query_param("orderBy", "startTime");
            then.status(200).json_body(json!({
                "items": [
                    {
                        "start": { "dateTime": "2025-07-04T09:00:00+05:30" },
                        "end": { "dateTime": "2025-07-04T10:00:00+05:30" }
                    },
                    {
                        "start": { "date": "2025-07-04" },
                        "end": { "date": "2025-07-05" }
                    },
                    {
                        "start": { "dateTime": "2025-07-04T13:00:00Z" },
                        "end": { "dateTime": "2025-07-04T13:30:00Z" }
                    }
                ]
            }));
        })
        .await;

    let busy = client(&server, Duration::from_secs(5))
        .list_events(
            Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 7, 5, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(busy.len(), 2);
    assert_eq!(busy[0].start, Utc.with_ymd_and_hms(2025, 7, 4, 3, 30, 0).unwrap());
    assert_eq!(busy[1].end, Utc.with_ymd_and_hms(2025, 7, 4, 13, 30, 0).unwrap());
}

#[tokio::test]
async fn provider_errors_carry_the_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/calendars/primary/events");
            then.status(404).json_body(json!({
                "error": { "code": 404, "message": "Not Found" }
            }));
        })
        .await;

    let err = client(&server, Duration::from_secs(5))
        .list_events(
            Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 7, 5, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap_err();

    match err {
        BookingError::GatewayUnavailable(message) => {
            assert!(message.contains("404"));
            assert!(message.contains("Not Found"));
        }
        other => panic!("expected GatewayUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/calendars/primary/events");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(json!({ "items": [] }));
        })
        .await;

    let timeout = Duration::from_millis(200);
    let err = client(&server, timeout)
        .list_events(
            Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 7, 5, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::GatewayTimeout(timeout));
}
