use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serenity::async_trait;

use crate::error::Result;
use crate::models::booking::{BookingResult, BusyInterval, EventRequest};

/// Read/write access to the calendar provider.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    async fn create_event(&self, request: &EventRequest, time_zone: &Tz) -> Result<BookingResult>;

    async fn list_events(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>>;
}
