use std::sync::Arc;

use serenity::model::gateway::GatewayIntents;
use thiserror::Error;

use crate::clients::booking_api::RemoteBookingClient;
use crate::clients::google_calendar::GoogleCalendarClient;
use crate::clients::openai_client::OpenAIHttpClient;
use crate::config::{ConfigError, Settings};
use crate::handlers::api;
use crate::handlers::discord::BotHandler;
use crate::service::assistant::Assistant;
use crate::service::booking_service::{BookingBackend, BookingService};
use crate::service::openai_service::OpenAIService;
use crate::service::routing::{HeuristicRouter, IntentRouter, OpenAIRouter};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build {client} client: {reason}")]
    Client { client: &'static str, reason: String },

    #[error("Discord client error: {0}")]
    Discord(#[from] serenity::Error),
}

pub fn build_booking_service(settings: &Settings) -> Result<Arc<BookingService>, StartupError> {
    let google = settings.require_google()?.clone();
    let gateway = GoogleCalendarClient::new(google, settings.http_timeout).map_err(|e| {
        StartupError::Client {
            client: "Google Calendar",
            reason: e.to_string(),
        }
    })?;
    Ok(Arc::new(BookingService::new(
        Arc::new(gateway),
        settings.slots.clone(),
    )))
}

/// Remote backend when `BOOKING_API_URL` is set, otherwise the calendar directly.
pub fn build_backend(settings: &Settings) -> Result<Arc<dyn BookingBackend>, StartupError> {
    match &settings.booking_api_url {
        Some(url) => {
            let client = RemoteBookingClient::new(url, settings.http_timeout).map_err(|e| {
                StartupError::Client {
                    client: "booking API",
                    reason: e.to_string(),
                }
            })?;
            tracing::info!(%url, "using remote booking backend");
            Ok(Arc::new(client))
        }
        None => {
            let service: Arc<dyn BookingBackend> = build_booking_service(settings)?;
            Ok(service)
        }
    }
}

pub fn build_router(settings: &Settings) -> Result<Arc<dyn IntentRouter>, StartupError> {
    match &settings.openai {
        Some(openai) => {
            let client = OpenAIHttpClient::new(openai.clone(), settings.http_timeout).map_err(|e| {
                StartupError::Client {
                    client: "OpenAI",
                    reason: e.to_string(),
                }
            })?;
            let service = OpenAIService::new(client, settings.slots.timezone);
            tracing::info!(model = %openai.model, "using LLM intent parser");
            Ok(Arc::new(OpenAIRouter::new(Arc::new(service))))
        }
        None => Ok(Arc::new(HeuristicRouter)),
    }
}

pub fn build_assistant(settings: &Settings) -> Result<Arc<Assistant>, StartupError> {
    Ok(Arc::new(Assistant::new(
        build_router(settings)?,
        build_backend(settings)?,
        settings.slots.timezone,
    )))
}

pub async fn run_api(settings: Settings) -> Result<(), StartupError> {
    let booking = build_booking_service(&settings)?;
    tracing::info!(addr = %settings.bind_addr, "booking API listening");
    warp::serve(api::routes(booking)).run(settings.bind_addr).await;
    Ok(())
}

pub async fn run_discord(settings: Settings) -> Result<(), StartupError> {
    let token = settings
        .discord_token
        .clone()
        .ok_or(ConfigError::Missing("DISCORD_CLIENT_SECRET"))?;
    let assistant = build_assistant(&settings)?;

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::Client::builder(token, intents)
        .event_handler(BotHandler::new(assistant))
        .await?;

    client.start().await?;
    Ok(())
}
