use serenity::async_trait;
use serenity::model::id::ChannelId;
use serenity::prelude::Context;

// Discord rejects messages longer than this.
const MAX_MESSAGE_CHARS: usize = 2000;

#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn reply(&self, content: &str);
    async fn typing(&self) {}
}

pub struct SerenityResponder<'a> {
    ctx: &'a Context,
    channel: ChannelId,
}

impl<'a> SerenityResponder<'a> {
    pub fn new(ctx: &'a Context, channel: ChannelId) -> Self {
        Self { ctx, channel }
    }
}

#[async_trait]
impl ChatResponder for SerenityResponder<'_> {
    async fn reply(&self, content: &str) {
        let body: String = content.chars().take(MAX_MESSAGE_CHARS).collect();
        if let Err(err) = self.channel.say(&self.ctx.http, body).await {
            tracing::warn!(error = %err, channel = %self.channel, "failed to send reply");
        }
    }

    async fn typing(&self) {
        let _ = self.channel.broadcast_typing(&self.ctx.http).await;
    }
}
