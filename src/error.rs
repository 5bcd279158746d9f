use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("search window start must be before its end")]
    InvalidWindow,

    #[error("slot duration and alignment must be positive")]
    InvalidDuration,

    #[error("could not parse {field} timestamp '{value}'")]
    MalformedTimestamp { field: &'static str, value: String },

    #[error("event title is empty")]
    EmptyTitle,

    #[error("event start must be before its end")]
    InvertedRange,

    #[error("calendar provider unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("calendar provider did not answer within {0:?}")]
    GatewayTimeout(Duration),

    #[error("message not recognized")]
    Unrecognized,
}

pub const USAGE_HINT: &str = "I can book meetings and show your free slots. Try:\n\
• `Book Team Sync from 2025-07-07T15:00:00 to 2025-07-07T16:00:00`\n\
• `What time am I free today?`";

impl BookingError {
    /// Stable identifier used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::InvalidWindow => "InvalidWindow",
            BookingError::InvalidDuration => "InvalidDuration",
            BookingError::MalformedTimestamp { .. } => "MalformedTimestamp",
            BookingError::EmptyTitle => "EmptyTitle",
            BookingError::InvertedRange => "InvertedRange",
            BookingError::GatewayUnavailable(_) => "GatewayUnavailable",
            BookingError::GatewayTimeout(_) => "GatewayTimeout",
            BookingError::Unrecognized => "Unrecognized",
        }
    }

    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            BookingError::GatewayUnavailable(_) | BookingError::GatewayTimeout(_)
        )
    }

    /// Short, actionable text shown to the person chatting with the bot.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::InvalidWindow => {
                "That time window is empty. Pick a window whose start is before its end.".to_string()
            }
            BookingError::InvalidDuration => {
                "Slot length must be a positive number of minutes.".to_string()
            }
            BookingError::MalformedTimestamp { field, value } => format!(
                "I couldn't read the {} time '{}'. Use a format like 2025-07-04T10:00:00.",
                field, value
            ),
            BookingError::EmptyTitle => "Please give the meeting a title.".to_string(),
            BookingError::InvertedRange => {
                "The meeting has to start before it ends.".to_string()
            }
            BookingError::GatewayUnavailable(_) => {
                "The calendar service is unavailable right now. Please try again later.".to_string()
            }
            BookingError::GatewayTimeout(_) => {
                "The calendar service took too long to answer. Please try again.".to_string()
            }
            BookingError::Unrecognized => USAGE_HINT.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
