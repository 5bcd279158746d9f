pub mod api;
pub mod discord;
pub mod discord_responder;
