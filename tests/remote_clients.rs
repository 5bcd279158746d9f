use std::sync::Arc;
use std::time::Duration;

use bookingBot::clients::booking_api::RemoteBookingClient;
use bookingBot::clients::openai_client::OpenAIHttpClient;
use bookingBot::config::OpenAISettings;
use bookingBot::error::BookingError;
use bookingBot::models::booking::EventRequest;
use bookingBot::service::booking_service::BookingBackend;
use bookingBot::service::openai_service::OpenAIService;
use bookingBot::service::routing::{Intent, IntentRouter, OpenAIRouter};
use chrono::{NaiveDate, TimeZone, Utc};
use httpmock::prelude::*;
use serde_json::json;

fn event() -> EventRequest {
    EventRequest {
        title: "Team Sync".to_string(),
        start: Utc.with_ymd_and_hms(2025, 7, 4, 4, 30, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 7, 4, 5, 30, 0).unwrap(),
    }
}

#[tokio::test]
async fn remote_backend_books_through_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/book")
                .body_contains("\"summary\":\"Team Sync\"")
                .body_contains("2025-07-04T04:30:00+00:00");
            then.status(200).json_body(json!({
                "status": "success",
                "event_link": "https://calendar.google.com/event?eid=x1",
                "event_id": "x1"
            }));
        })
        .await;

    let client = RemoteBookingClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let result = client.book(&event()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.event_id, "x1");
}

#[tokio::test]
async fn remote_backend_fetches_dated_slots() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/slots").query_param("date", "2025-07-04");
            then.status(200).json_body(json!({
                "available_slots": ["10:00 AM to 11:00 AM"]
            }));
        })
        .await;

    let client = RemoteBookingClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let slots = client
        .available_slots(NaiveDate::from_ymd_opt(2025, 7, 4))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(slots, vec!["10:00 AM to 11:00 AM"]);
}

#[tokio::test]
async fn remote_validation_errors_keep_their_kind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/book");
            then.status(400).json_body(json!({
                "error": "event start must be before its end",
                "kind": "InvertedRange"
            }));
        })
        .await;

    let client = RemoteBookingClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    assert_eq!(client.book(&event()).await, Err(BookingError::InvertedRange));
}

#[tokio::test]
async fn remote_outage_is_gateway_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slots");
            then.status(502).json_body(json!({
                "error": "calendar provider unavailable: 403 Forbidden",
                "kind": "GatewayUnavailable"
            }));
        })
        .await;

    let client = RemoteBookingClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let err = client.available_slots(None).await.unwrap_err();
    assert_eq!(err.kind(), "GatewayUnavailable");
}

#[tokio::test]
async fn remote_timeout_stays_a_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slots");
            then.status(504).json_body(json!({
                "error": "calendar provider did not answer within 10s",
                "kind": "GatewayTimeout"
            }));
        })
        .await;

    let timeout = Duration::from_secs(5);
    let client = RemoteBookingClient::new(&server.base_url(), timeout).unwrap();
    let err = client.available_slots(None).await.unwrap_err();
    assert_eq!(err, BookingError::GatewayTimeout(timeout));
    assert!(err.user_message().contains("took too long"));
}

#[tokio::test]
async fn bare_504_is_a_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/book");
            then.status(504).body("upstream timed out");
        })
        .await;

    let timeout = Duration::from_secs(5);
    let client = RemoteBookingClient::new(&server.base_url(), timeout).unwrap();
    assert_eq!(
        client.book(&event()).await,
        Err(BookingError::GatewayTimeout(timeout))
    );
}

#[tokio::test]
async fn remote_malformed_timestamp_keeps_field() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slots").query_param("date", "2025-07-04");
            then.status(400).json_body(json!({
                "error": "could not parse date timestamp 'July 4th'",
                "kind": "MalformedTimestamp",
                "field": "date",
                "value": "July 4th"
            }));
        })
        .await;

    let client = RemoteBookingClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let err = client
        .available_slots(NaiveDate::from_ymd_opt(2025, 7, 4))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::MalformedTimestamp {
            field: "date",
            value: "July 4th".to_string(),
        }
    );
}

#[tokio::test]
async fn llm_router_over_http() {
    let server = MockServer::start_async().await;
    let content = r#"{"intent":"book","title":"Design Review","start_time":"2025-07-08T14:00:00","end_time":"2025-07-08T15:00:00"}"#;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("Authorization", "Bearer sk-test")
                .body_contains("\"model\":\"test-model\"")
                .body_contains("Asia/Kolkata");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            }));
        })
        .await;

    let http = OpenAIHttpClient::new(
        OpenAISettings {
            api_key: "sk-test".to_string(),
            base_url: server.base_url(),
            model: "test-model".to_string(),
        },
        Duration::from_secs(5),
    )
    .unwrap();
    let service = OpenAIService::new(http, chrono_tz::Asia::Kolkata);
    let router = OpenAIRouter::new(Arc::new(service));

    let result = router.route("set up the design review next Tuesday 2-3pm").await;

    mock.assert_async().await;
    match result.intent {
        Intent::Book(req) => {
            assert_eq!(req.title, "Design Review");
            assert_eq!(req.start, "2025-07-08T14:00:00");
        }
        other => panic!("expected booking, got {:?}", other),
    }
}

#[tokio::test]
async fn llm_http_failure_falls_back_to_patterns() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limited");
        })
        .await;

    let http = OpenAIHttpClient::new(
        OpenAISettings {
            api_key: "sk-test".to_string(),
            base_url: server.base_url(),
            model: "test-model".to_string(),
        },
        Duration::from_secs(5),
    )
    .unwrap();
    let router = OpenAIRouter::new(Arc::new(OpenAIService::new(http, chrono_tz::UTC)));

    let result = router.route("Show available slots").await;
    assert_eq!(result.intent, Intent::Availability);
}
