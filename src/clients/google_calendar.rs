//! Google Calendar v3 gateway.
//!
//! Authenticates with a bearer token supplied through configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serenity::async_trait;

use crate::config::GoogleSettings;
use crate::error::{BookingError, Result};
use crate::models::booking::{BookingResult, BusyInterval, EventRequest};
use crate::service::calendar_gateway::CalendarGateway;

#[derive(Debug, Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
    #[serde(rename = "htmlLink", default)]
    html_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsList {
    #[serde(default)]
    items: Vec<ListedEvent>,
}

#[derive(Debug, Deserialize)]
struct ListedEvent {
    start: EventTime,
    end: EventTime,
}

pub struct GoogleCalendarClient {
    http: Client,
    settings: GoogleSettings,
    timeout: Duration,
}

impl GoogleCalendarClient {
    pub fn new(settings: GoogleSettings, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            settings,
            timeout,
        })
    }

    fn events_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.settings.api_base)
            .map_err(|e| BookingError::GatewayUnavailable(format!("bad API base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BookingError::GatewayUnavailable("API base url cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["calendars", self.settings.calendar_id.as_str(), "events"]);
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> BookingError {
        if err.is_timeout() {
            tracing::warn!(timeout = ?self.timeout, "calendar request timed out");
            BookingError::GatewayTimeout(self.timeout)
        } else {
            tracing::warn!(error = %err, "calendar request failed");
            BookingError::GatewayUnavailable(err.to_string())
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            tracing::warn!(%status, body = %text, "calendar provider rejected request");
            return Err(BookingError::GatewayUnavailable(provider_message(status, &text)));
        }
        Ok(text)
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendarClient {
    async fn create_event(&self, request: &EventRequest, time_zone: &Tz) -> Result<BookingResult> {
        let body = EventBody {
            summary: &request.title,
            start: local_time(request.start, time_zone),
            end: local_time(request.end, time_zone),
        };
        let response = self
            .http
            .post(self.events_url()?)
            .bearer_auth(&self.settings.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let text = self.read_body(response).await?;
        let created: CreatedEvent = serde_json::from_str(&text).map_err(|e| {
            BookingError::GatewayUnavailable(format!("unexpected create response: {e}"))
        })?;
        Ok(BookingResult {
            event_id: created.id,
            event_link: created.html_link.unwrap_or_default(),
        })
    }

    async fn list_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let response = self
            .http
            .get(self.events_url()?)
            .bearer_auth(&self.settings.access_token)
            .query(&[
                ("timeMin", window_start.to_rfc3339()),
                ("timeMax", window_end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let text = self.read_body(response).await?;
        let listed: EventsList = serde_json::from_str(&text).map_err(|e| {
            BookingError::GatewayUnavailable(format!("unexpected list response: {e}"))
        })?;

        // All-day events carry `date` only and do not block hourly slots.
        let busy = listed
            .items
            .iter()
            .filter_map(|event| {
                let start = parse_rfc3339(event.start.date_time.as_deref()?)?;
                let end = parse_rfc3339(event.end.date_time.as_deref()?)?;
                BusyInterval::new(start, end).ok()
            })
            .collect();
        Ok(busy)
    }
}

fn local_time(at: DateTime<Utc>, tz: &Tz) -> EventTime {
    EventTime {
        date_time: Some(at.with_timezone(tz).to_rfc3339()),
        date: None,
        time_zone: Some(tz.name().to_string()),
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn provider_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        error: ApiErrorDetail,
    }
    #[derive(Deserialize)]
    struct ApiErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ApiError>(body) {
        Ok(parsed) => format!("{}: {}", status, parsed.error.message),
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}
