use std::sync::Arc;

use chrono_tz::Tz;

use crate::error::{BookingError, Result};
use crate::models::booking::{BookingResult, EventRequest};
use crate::service::booking_service::BookingBackend;
use crate::service::normalizer;
use crate::service::routing::{BookRequest, Intent, IntentRouter};

/// Entry point for chat front ends: one message in, one reply out.
pub struct Assistant {
    router: Arc<dyn IntentRouter>,
    backend: Arc<dyn BookingBackend>,
    timezone: Tz,
}

impl Assistant {
    pub fn new(router: Arc<dyn IntentRouter>, backend: Arc<dyn BookingBackend>, timezone: Tz) -> Self {
        Self {
            router,
            backend,
            timezone,
        }
    }

    pub async fn handle_message(&self, text: &str) -> String {
        let routed = self.router.route(text).await;
        let outcome = match routed.intent {
            Intent::Book(request) => self.book(&request).await,
            Intent::Availability => self.availability().await,
            Intent::Unrecognized => Err(BookingError::Unrecognized),
        };

        match outcome {
            Ok(reply) => reply,
            Err(err) => {
                if err.is_validation() {
                    tracing::info!(kind = err.kind(), "request rejected");
                } else {
                    tracing::warn!(kind = err.kind(), error = %err, "backend call failed");
                }
                format!("❌ {}", err.user_message())
            }
        }
    }

    async fn book(&self, request: &BookRequest) -> Result<String> {
        let event = normalizer::normalize(&request.title, &request.start, &request.end, &self.timezone)?;
        let result = self.backend.book(&event).await?;
        Ok(render_confirmation(&event, &result, &self.timezone))
    }

    async fn availability(&self) -> Result<String> {
        let slots = self.backend.available_slots(None).await?;
        Ok(render_slots(&slots))
    }
}

pub fn render_confirmation(event: &EventRequest, result: &BookingResult, tz: &Tz) -> String {
    let start = event.start.with_timezone(tz).format("%B %d, %Y at %I:%M %p");
    let end = event.end.with_timezone(tz).format("%I:%M %p");
    let mut reply = format!("✅ Event '{}' booked on {} to {}.", event.title, start, end);
    if !result.event_link.is_empty() {
        reply.push_str(&format!(" [View event]({})", result.event_link));
    }
    reply
}

pub fn render_slots(slots: &[String]) -> String {
    if slots.is_empty() {
        return "❌ You have no free slots today.".to_string();
    }
    let lines: Vec<String> = slots.iter().map(|slot| format!("• {}", slot)).collect();
    format!("✅ Available slots:\n{}", lines.join("\n"))
}
