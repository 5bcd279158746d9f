use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OpenAISettings;

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

pub fn build_prompt(
    prompt: &str,
    prompt_type: &str,
    now: DateTime<Utc>,
    timezone: &Tz,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let full_prompt = match prompt_type {
        "booking_intent" => format!(
            "You are an intent parser for a calendar booking assistant.\n\
             Current date and time (UTC): {now}\n\
             User timezone: {timezone}\n\
             Task: Classify the user's message into one of these intents:\n\
             - book: the user wants to put a meeting on the calendar\n\
             - availability: the user asks when they are free or for open slots\n\
             - unknown: anything else, or a booking request that lacks a title, start or end\n\
             Rules:\n\
             - For book, extract \"title\", \"start_time\" and \"end_time\".\n\
             - Times are ISO-8601 local datetimes in the user's timezone without offset, e.g. 2025-07-04T10:00:00.\n\
             - Resolve relative dates (\"tomorrow\", \"next Monday\") from the current date.\n\
             - If the user gives a start but no end, use unknown. Never guess a duration.\n\
             Output ONLY raw JSON, no prose, markdown, or code fences.\n\
             The JSON shape must be exactly:\n\
             {{\"intent\":\"book|availability|unknown\",\"title\":\"<string or null>\",\"start_time\":\"<ISO-8601 or null>\",\"end_time\":\"<ISO-8601 or null>\"}}\n\
             User message: \"{user_prompt}\"",
            now = now.to_rfc3339(),
            timezone = timezone.name(),
            user_prompt = prompt
        ),
        _ => return Err("Not a valid base prompt".to_string().into()),
    };
    Ok(full_prompt)
}

fn system_message(prompt_type: &str) -> &'static str {
    match prompt_type {
        "booking_intent" => {
            "You are a strict JSON intent parser. Reply ONLY with a single JSON object, with no markdown, no backticks, and no extra text."
        }
        _ => "You are a helpful assistant.",
    }
}

pub struct OpenAIHttpClient {
    http: Client,
    settings: OpenAISettings,
}

impl OpenAIHttpClient {
    pub fn new(
        settings: OpenAISettings,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, settings })
    }

    pub async fn query(
        &self,
        prompt: String,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let request = OpenAIRequest {
            model: self.settings.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system_message(prompt_type).to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            max_tokens: 300,
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, body = %text, "LLM request failed");
            return Err(format!("Request failed with status {}", status).into());
        }

        let parsed: OpenAIResponse = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse JSON: {}\nRaw body: {}", e, text))?;

        match parsed.choices.first() {
            Some(choice) => Ok(choice.message.content.clone()),
            None => Err("No response from OpenAI".to_string().into()),
        }
    }
}
