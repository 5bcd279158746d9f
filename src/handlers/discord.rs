use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;

use crate::handlers::discord_responder::{ChatResponder, SerenityResponder};
use crate::service::assistant::Assistant;

pub struct BotHandler {
    assistant: Arc<Assistant>,
}

impl BotHandler {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        BotHandler { assistant }
    }

    /// Runs one chat turn and sends the answer through `responder`.
    pub async fn handle_message_with(&self, responder: &dyn ChatResponder, text: &str) -> String {
        let text = strip_mentions(text);
        let reply = if text.is_empty() {
            crate::error::BookingError::Unrecognized.user_message()
        } else {
            responder.typing().await;
            self.assistant.handle_message(&text).await
        };
        responder.reply(&reply).await;
        reply
    }
}

/// Removes `<@123>` / `<@!123>` mention tokens and surrounding whitespace.
pub fn strip_mentions(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !(word.starts_with("<@") && word.ends_with('>')))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let is_direct = msg.guild_id.is_none();
        let mentioned = msg.mentions_me(&ctx).await.unwrap_or(false);
        if !is_direct && !mentioned {
            return;
        }

        tracing::debug!(author = %msg.author.id, channel = %msg.channel_id, "chat message");
        let responder = SerenityResponder::new(&ctx, msg.channel_id);
        self.handle_message_with(&responder, &msg.content).await;
    }

    async fn ready(&self, _: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, "connected to Discord");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_are_removed() {
        assert_eq!(strip_mentions("<@123> am I free today?"), "am I free today?");
        assert_eq!(strip_mentions("  <@!42>   "), "");
    }
}
