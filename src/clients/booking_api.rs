use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serenity::async_trait;

use crate::error::{BookingError, Result};
use crate::models::booking::{
    BookBody, BookResponse, BookingResult, ErrorMessage, EventRequest, SlotsResponse,
};
use crate::service::booking_service::BookingBackend;

/// Talks to a running booking backend over its HTTP API.
pub struct RemoteBookingClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteBookingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> BookingError {
        if err.is_timeout() {
            BookingError::GatewayTimeout(self.timeout)
        } else {
            BookingError::GatewayUnavailable(err.to_string())
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(self.remote_error(status, &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| BookingError::GatewayUnavailable(format!("unexpected backend response: {e}")))
    }

    // Errors reported by the backend keep their identity.
    fn remote_error(&self, status: reqwest::StatusCode, body: &str) -> BookingError {
        let Ok(message) = serde_json::from_str::<ErrorMessage>(body) else {
            if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
                return BookingError::GatewayTimeout(self.timeout);
            }
            return BookingError::GatewayUnavailable(format!("{}: {}", status, body.trim()));
        };
        match message.kind.as_str() {
            "EmptyTitle" => BookingError::EmptyTitle,
            "InvertedRange" => BookingError::InvertedRange,
            "InvalidWindow" => BookingError::InvalidWindow,
            "InvalidDuration" => BookingError::InvalidDuration,
            "Unrecognized" => BookingError::Unrecognized,
            "MalformedTimestamp" => BookingError::MalformedTimestamp {
                field: timestamp_field(message.field.as_deref()),
                value: message.value.unwrap_or_default(),
            },
            "GatewayTimeout" => BookingError::GatewayTimeout(self.timeout),
            _ => BookingError::GatewayUnavailable(format!("{}: {}", status, message.error)),
        }
    }
}

fn timestamp_field(field: Option<&str>) -> &'static str {
    match field {
        Some("start") => "start",
        Some("end") => "end",
        Some("date") => "date",
        _ => "timestamp",
    }
}

#[async_trait]
impl BookingBackend for RemoteBookingClient {
    async fn book(&self, request: &EventRequest) -> Result<BookingResult> {
        let body = BookBody {
            summary: request.title.clone(),
            start_time: request.start.to_rfc3339(),
            end_time: request.end.to_rfc3339(),
        };
        let response = self
            .http
            .post(format!("{}/book", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let booked: BookResponse = self.read_json(response).await?;
        Ok(BookingResult {
            event_id: booked.event_id,
            event_link: booked.event_link,
        })
    }

    async fn available_slots(&self, day: Option<NaiveDate>) -> Result<Vec<String>> {
        let mut request = self.http.get(format!("{}/slots", self.base_url));
        if let Some(day) = day {
            request = request.query(&[("date", day.format("%Y-%m-%d").to_string())]);
        }
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let slots: SlotsResponse = self.read_json(response).await?;
        Ok(slots.available_slots)
    }
}
