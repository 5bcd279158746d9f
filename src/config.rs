use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

pub const DEFAULT_RUN_MODE: &str = "cli";
pub const DEFAULT_GOOGLE_API: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_OPENAI_API: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

const MAX_SLOT_MINUTES: u32 = 24 * 60;
const MAX_LOOKAHEAD_HOURS: u32 = 24;
const MAX_TIMEOUT_SECS: u32 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid config line {line}: {content}")]
    Syntax { line: usize, content: String },

    #[error("unable to read config file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::Syntax {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct GoogleSettings {
    pub calendar_id: String,
    pub access_token: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// How availability windows are cut into slots.
#[derive(Debug, Clone)]
pub struct SlotSettings {
    pub timezone: Tz,
    pub slot_duration: chrono::Duration,
    pub align_to: chrono::Duration,
    pub lookahead: chrono::Duration,
    pub workday_start_hour: u32,
    pub workday_end_hour: u32,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
            slot_duration: chrono::Duration::hours(1),
            align_to: chrono::Duration::hours(1),
            lookahead: chrono::Duration::hours(10),
            workday_start_hour: 9,
            workday_end_hour: 17,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub run_mode: String,
    pub bind_addr: SocketAddr,
    pub google: Option<GoogleSettings>,
    pub openai: Option<OpenAISettings>,
    pub slots: SlotSettings,
    pub http_timeout: Duration,
    pub booking_api_url: Option<String>,
    pub discord_token: Option<String>,
    pub log_format: LogFormat,
}

impl Settings {
    /// Builds settings from a key lookup, usually the config file with the
    /// process environment as fallback.
    pub fn from_lookup<F>(get_prop: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get_prop(key).filter(|v| !v.trim().is_empty());

        let google = match (get("GOOGLE_CALENDAR_ID"), get("GOOGLE_ACCESS_TOKEN")) {
            (Some(calendar_id), Some(access_token)) => Some(GoogleSettings {
                calendar_id,
                access_token,
                api_base: get("GOOGLE_CALENDAR_API_URL").unwrap_or(DEFAULT_GOOGLE_API.to_string()),
            }),
            _ => None,
        };

        let openai = get("OPENAI_API_KEY").map(|api_key| OpenAISettings {
            api_key,
            base_url: get("OPENAI_BASE_URL").unwrap_or(DEFAULT_OPENAI_API.to_string()),
            model: get("OPENAI_MODEL").unwrap_or(DEFAULT_OPENAI_MODEL.to_string()),
        });

        let timezone_name = get("CALENDAR_TIMEZONE").unwrap_or(DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name.parse::<Tz>().map_err(|e| {
            ConfigError::Invalid {
                key: "CALENDAR_TIMEZONE",
                value: timezone_name.clone(),
                reason: e.to_string(),
            }
        })?;

        let slot_minutes = parse_bounded(&get, "SLOT_DURATION_MINUTES", 60, MAX_SLOT_MINUTES)?;
        let align_minutes = parse_bounded(&get, "SLOT_ALIGN_MINUTES", 60, MAX_SLOT_MINUTES)?;
        let lookahead_hours = parse_bounded(&get, "SLOT_LOOKAHEAD_HOURS", 10, MAX_LOOKAHEAD_HOURS)?;
        let workday_start_hour = parse_number(&get, "WORKDAY_START_HOUR", 9)?;
        let workday_end_hour = parse_number(&get, "WORKDAY_END_HOUR", 17)?;
        if workday_start_hour >= workday_end_hour || workday_end_hour > 24 {
            return Err(ConfigError::Invalid {
                key: "WORKDAY_END_HOUR",
                value: workday_end_hour.to_string(),
                reason: format!("must be after WORKDAY_START_HOUR ({workday_start_hour}) and at most 24"),
            });
        }
        let timeout_secs = parse_bounded(&get, "HTTP_TIMEOUT_SECS", 10, MAX_TIMEOUT_SECS)?;

        let bind_raw = get("BIND_ADDR").unwrap_or("0.0.0.0:8000".to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("compact") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected 'compact' or 'json'".to_string(),
                });
            }
        };

        Ok(Self {
            run_mode: get("RUN_MODE").unwrap_or(DEFAULT_RUN_MODE.to_string()),
            bind_addr,
            google,
            openai,
            slots: SlotSettings {
                timezone,
                slot_duration: chrono::Duration::minutes(slot_minutes as i64),
                align_to: chrono::Duration::minutes(align_minutes as i64),
                lookahead: chrono::Duration::hours(lookahead_hours as i64),
                workday_start_hour,
                workday_end_hour,
            },
            http_timeout: Duration::from_secs(timeout_secs as u64),
            booking_api_url: get("BOOKING_API_URL").map(|url| url.trim_end_matches('/').to_string()),
            discord_token: get("DISCORD_CLIENT_SECRET"),
            log_format,
        })
    }

    pub fn require_google(&self) -> Result<&GoogleSettings, ConfigError> {
        self.google
            .as_ref()
            .ok_or(ConfigError::Missing("GOOGLE_CALENDAR_ID and GOOGLE_ACCESS_TOKEN"))
    }
}

fn parse_number<G>(get: &G, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

// A zero or oversized value would fail every availability request later.
fn parse_bounded<G>(get: &G, key: &'static str, default: u32, max: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = parse_number(get, key, default)?;
    if value == 0 || value > max {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be between 1 and {max}"),
        });
    }
    Ok(value)
}
