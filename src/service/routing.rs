use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serenity::async_trait;

use crate::service::openai_service::OpenAIClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRequest {
    pub title: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Book(BookRequest),
    Availability,
    Unrecognized,
}

#[derive(Debug, Clone)]
pub struct IntentResult {
    pub intent: Intent,
    pub normalized_text: String,
}

#[async_trait]
pub trait IntentRouter: Send + Sync {
    async fn route(&self, text: &str) -> IntentResult;
}

pub struct HeuristicRouter;

#[async_trait]
impl IntentRouter for HeuristicRouter {
    async fn route(&self, text: &str) -> IntentResult {
        route_intent(text)
    }
}

pub struct OpenAIRouter {
    openai: Arc<dyn OpenAIClient>,
}

impl OpenAIRouter {
    pub fn new(openai: Arc<dyn OpenAIClient>) -> Self {
        Self { openai }
    }
}

#[async_trait]
impl IntentRouter for OpenAIRouter {
    async fn route(&self, text: &str) -> IntentResult {
        match self.openai.generate_prompt(text, "booking_intent").await {
            Ok(payload) => parse_router_payload(text, &payload).unwrap_or_else(|| {
                tracing::debug!("unparsable intent payload, using pattern matcher");
                route_intent(text)
            }),
            Err(err) => {
                tracing::warn!(error = %err, "intent service failed, using pattern matcher");
                route_intent(text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouterPayload {
    intent: String,
    title: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

fn parse_router_payload(text: &str, payload: &str) -> Option<IntentResult> {
    let parsed: RouterPayload = serde_json::from_str(strip_code_fence(payload)).ok()?;
    let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let intent = match parsed.intent.trim().to_lowercase().as_str() {
        "book" => match (
            present(parsed.title),
            present(parsed.start_time),
            present(parsed.end_time),
        ) {
            (Some(title), Some(start), Some(end)) => Intent::Book(BookRequest { title, start, end }),
            _ => Intent::Unrecognized,
        },
        "availability" => Intent::Availability,
        _ => Intent::Unrecognized,
    };
    Some(IntentResult {
        intent,
        normalized_text: text.trim().to_string(),
    })
}

// Models occasionally wrap JSON in ``` fences despite instructions.
fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

static BOOK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbook\s+(.+?)\s+from\s+([0-9][0-9T:.+\-Z ]*?[0-9Z])\s+to\s+([0-9][0-9T:.+\-Z ]*[0-9Z])\s*[.!]?\s*$")
        .expect("booking pattern compiles")
});

static BOOK_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbook").expect("book keyword pattern compiles"));

const AVAILABILITY_WORDS: [&str; 4] = ["free", "available", "availability", "slots"];

pub fn route_intent(text: &str) -> IntentResult {
    let normalized = text.trim().to_string();

    let intent = if let Some(caps) = BOOK_PATTERN.captures(&normalized) {
        Intent::Book(BookRequest {
            title: caps[1].trim().to_string(),
            start: caps[2].trim().to_string(),
            end: caps[3].trim().to_string(),
        })
    } else if BOOK_WORD.is_match(&normalized) {
        // Half a booking is never acted on.
        Intent::Unrecognized
    } else if has_availability_words(&normalized) {
        Intent::Availability
    } else {
        Intent::Unrecognized
    };

    IntentResult {
        intent,
        normalized_text: normalized,
    }
}

fn has_availability_words(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| AVAILABILITY_WORDS.contains(&word))
}
