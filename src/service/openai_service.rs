use chrono::Utc;
use chrono_tz::Tz;
use serenity::async_trait;

use crate::clients::openai_client::{self, OpenAIHttpClient};

#[async_trait]
pub trait OpenAIClient: Send + Sync {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct OpenAIService {
    client: OpenAIHttpClient,
    timezone: Tz,
}

impl OpenAIService {
    pub fn new(client: OpenAIHttpClient, timezone: Tz) -> Self {
        Self { client, timezone }
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let full_prompt = openai_client::build_prompt(prompt, prompt_type, Utc::now(), &self.timezone)?;
        self.client.query(full_prompt, prompt_type).await
    }
}
