//! Slack Web API client.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::message::format_summary_payload;
use super::models::{
    ChannelRequest, CreateChannelRequest, CreateChannelResponse, Empty, InviteRequest,
    PinRequest, PostMessageResponse, UsersListResponse,
};
use crate::config::SlackConfig;
use crate::error::{EscalationError, Result};
use crate::messaging::{Channel, Member, Messenger};
use crate::pm::IssueSummary;

/// Slack requires the charset on JSON bodies to avoid `missing_charset` warnings.
const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Slack Web API client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    api_url: String,
    bot_token: Option<String>,
}

impl SlackClient {
    /// Create a new Slack client.
    ///
    /// A missing bot token is not an error here; every call will fail with
    /// [`EscalationError::Auth`] instead.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: SlackConfig, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build Slack HTTP client")?;

        if config.bot_token.is_none() {
            warn!("SLACK_BOT_TOKEN not set - Slack calls will fail");
        }

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token,
        })
    }

    fn token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or(EscalationError::Auth("SLACK_BOT_TOKEN"))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.api_url)
    }

    /// POST a JSON body to a Web API method.
    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.token()?;
        let request = self
            .client
            .post(self.endpoint(method))
            .bearer_auth(token)
            .header(CONTENT_TYPE, JSON_UTF8)
            .json(body);
        Self::call(method, request).await
    }

    /// GET a Web API method without arguments.
    async fn get<R: DeserializeOwned>(&self, method: &str) -> Result<R> {
        let token = self.token()?;
        let request = self.client.get(self.endpoint(method)).bearer_auth(token);
        Self::call(method, request).await
    }

    /// Send the request and unwrap Slack's `{ "ok": .., "error": .. }` envelope.
    async fn call<R: DeserializeOwned>(
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<R> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(method, status = %status, body = %body, "Slack API request failed");
            return Err(EscalationError::remote(format!("Slack returned {status}")));
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;
        debug!(method, response = %body, "Slack API response");

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            warn!(method, error = %reason, "Slack API returned an error");
            return Err(EscalationError::remote(reason));
        }

        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl Messenger for SlackClient {
    fn name(&self) -> &'static str {
        "slack"
    }

    #[instrument(skip(self))]
    async fn create_channel(&self, name: &str) -> Result<Channel> {
        let response: CreateChannelResponse = self
            .post("conversations.create", &CreateChannelRequest { name })
            .await?;

        info!(
            channel_id = %response.channel.id,
            channel_name = %response.channel.name,
            "Channel created"
        );
        Ok(response.channel)
    }

    #[instrument(skip(self))]
    async fn join_channel(&self, channel_id: &str) -> Result<()> {
        let _: Empty = self
            .post("conversations.join", &ChannelRequest { channel: channel_id })
            .await?;

        info!(channel_id, "Bot joined channel");
        Ok(())
    }

    #[instrument(skip(self, issue), fields(issue_key = %issue.key))]
    async fn send_message(
        &self,
        channel_id: &str,
        issue: &IssueSummary,
        case_url: &str,
    ) -> Result<String> {
        let payload = format_summary_payload(channel_id, issue, case_url, Utc::now());
        let response: PostMessageResponse = self.post("chat.postMessage", &payload).await?;

        info!(channel_id, ts = %response.ts, "Case summary posted");
        Ok(response.ts)
    }

    #[instrument(skip(self))]
    async fn pin_message(&self, channel_id: &str, timestamp: &str) -> Result<()> {
        let _: Empty = self
            .post(
                "pins.add",
                &PinRequest {
                    channel: channel_id,
                    timestamp,
                },
            )
            .await?;

        info!(channel_id, timestamp, "Message pinned");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_members(&self) -> Result<Vec<Member>> {
        let response: UsersListResponse = self.get("users.list").await?;

        debug!(count = response.members.len(), "Listed workspace members");
        Ok(response.members)
    }

    #[instrument(skip(self))]
    async fn invite_users(&self, channel_id: &str, user_ids: &[String]) -> Result<()> {
        let _: Empty = self
            .post(
                "conversations.invite",
                &InviteRequest {
                    channel: channel_id,
                    users: user_ids.join(","),
                },
            )
            .await?;

        info!(channel_id, user_ids = ?user_ids, "Users invited");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn archive_channel(&self, channel_id: &str) -> Result<()> {
        let _: Empty = self
            .post("conversations.archive", &ChannelRequest { channel: channel_id })
            .await?;

        info!(channel_id, "Channel archived");
        Ok(())
    }
}
