//! Slack Web API integration.
//!
//! # Configuration
//!
//! - `SLACK_BOT_TOKEN`: Bot token with `channels:manage`, `channels:join`,
//!   `chat:write`, `pins:write` and `users:read` scopes
//! - `SLACK_API_URL`: Web API base URL (default `https://slack.com/api`)

mod client;
mod message;
mod models;

pub use client::SlackClient;
pub use message::{format_summary_payload, SlackBlock, SlackMessagePayload, SlackText};
