use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serenity::async_trait;

use crate::config::SlotSettings;
use crate::error::{BookingError, Result};
use crate::models::booking::{BookingResult, EventRequest, Slot};
use crate::service::calendar_gateway::CalendarGateway;
use crate::service::normalizer;
use crate::service::slot_finder::{self, local_instant};

/// What the assistant needs from a booking backend, whether it runs in
/// process or behind HTTP.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn book(&self, request: &EventRequest) -> Result<BookingResult>;

    /// Slot labels for `day`'s working hours, or the rest of today when `None`.
    async fn available_slots(&self, day: Option<NaiveDate>) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Local midnight of the searched day; slot boundaries are counted from here.
    pub anchor: DateTime<Utc>,
}

pub struct BookingService {
    gateway: Arc<dyn CalendarGateway>,
    slots: SlotSettings,
}

impl BookingService {
    pub fn new(gateway: Arc<dyn CalendarGateway>, slots: SlotSettings) -> Self {
        Self { gateway, slots }
    }

    /// Normalizes the raw fields and writes the event.
    pub async fn book_raw(&self, title: &str, start: &str, end: &str) -> Result<BookingResult> {
        let request = normalizer::normalize(title, start, end, &self.slots.timezone)?;
        self.create(&request).await
    }

    pub async fn create(&self, request: &EventRequest) -> Result<BookingResult> {
        let result = self.gateway.create_event(request, &self.slots.timezone).await?;
        tracing::info!(
            event_id = %result.event_id,
            title = %request.title,
            start = %request.start,
            "booked event"
        );
        Ok(result)
    }

    /// From `now` to the end of the local day, capped by the lookahead.
    pub fn today_window(&self, now: DateTime<Utc>) -> Result<SearchWindow> {
        let tz = &self.slots.timezone;
        let day = now.with_timezone(tz).date_naive();
        let anchor = local_instant(tz, day, 0).ok_or(BookingError::InvalidWindow)?;
        let next_midnight = local_instant(tz, day, 24).ok_or(BookingError::InvalidWindow)?;
        Ok(SearchWindow {
            start: now,
            end: now
                .checked_add_signed(self.slots.lookahead)
                .map_or(next_midnight, |horizon| horizon.min(next_midnight)),
            anchor,
        })
    }

    pub fn workday_window(&self, day: NaiveDate) -> Result<SearchWindow> {
        let tz = &self.slots.timezone;
        let start = local_instant(tz, day, self.slots.workday_start_hour);
        let end = local_instant(tz, day, self.slots.workday_end_hour);
        let anchor = local_instant(tz, day, 0);
        match (start, end, anchor) {
            (Some(start), Some(end), Some(anchor)) => Ok(SearchWindow { start, end, anchor }),
            _ => Err(BookingError::InvalidWindow),
        }
    }

    pub async fn free_slots(&self, window: SearchWindow) -> Result<Vec<Slot>> {
        if window.start >= window.end {
            return Err(BookingError::InvalidWindow);
        }
        let busy = self.gateway.list_events(window.start, window.end).await?;
        let slots = slot_finder::find_free_slots_anchored(
            &busy,
            window.start,
            window.end,
            self.slots.slot_duration,
            self.slots.align_to,
            window.anchor,
        )?;
        tracing::debug!(busy = busy.len(), free = slots.len(), "computed free slots");
        Ok(slots)
    }

    pub async fn slot_labels(&self, day: Option<NaiveDate>, now: DateTime<Utc>) -> Result<Vec<String>> {
        let window = match day {
            Some(day) => self.workday_window(day)?,
            None => self.today_window(now)?,
        };
        let slots = self.free_slots(window).await?;
        Ok(slots
            .iter()
            .map(|slot| slot_finder::format_slot(slot, &self.slots.timezone))
            .collect())
    }
}

#[async_trait]
impl BookingBackend for BookingService {
    async fn book(&self, request: &EventRequest) -> Result<BookingResult> {
        self.create(request).await
    }

    async fn available_slots(&self, day: Option<NaiveDate>) -> Result<Vec<String>> {
        self.slot_labels(day, Utc::now()).await
    }
}
