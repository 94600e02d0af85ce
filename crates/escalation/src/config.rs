//! Configuration for the escalation service.

use std::env;
use std::time::Duration;

/// Default Slack Web API base URL.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Escalation service configuration.
///
/// Built once at startup and handed to each client; nothing reads the
/// environment after that.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    /// Archive the channel when a step after creation fails.
    pub archive_on_failure: bool,
    /// Slack configuration.
    pub slack: SlackConfig,
    /// Jira configuration.
    pub jira: JiraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(9090),
            request_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(10),
            ),
            archive_on_failure: env::var("ESCALATION_ARCHIVE_ON_FAILURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            slack: SlackConfig::default(),
            jira: JiraConfig::default(),
        }
    }
}

/// Slack app configuration.
#[derive(Clone)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`) used for Web API calls.
    pub bot_token: Option<String>,
    /// Web API base URL.
    pub api_url: String,
    /// Signing secret for verifying inbound slash commands.
    pub signing_secret: Option<String>,
    /// Maximum age of `X-Slack-Request-Timestamp` (default: 300 seconds).
    pub max_timestamp_age_secs: i64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: non_empty_var("SLACK_BOT_TOKEN"),
            api_url: non_empty_var("SLACK_API_URL")
                .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),
            signing_secret: non_empty_var("SLACK_SIGNING_SECRET"),
            max_timestamp_age_secs: env::var("SLACK_MAX_TIMESTAMP_AGE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Jira account configuration.
#[derive(Clone)]
pub struct JiraConfig {
    /// Account email used for basic auth.
    pub email: Option<String>,
    /// API token paired with the email.
    pub api_token: Option<String>,
    /// REST API version in `/rest/api/<version>/issue/<KEY>`.
    pub api_version: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            email: non_empty_var("JIRA_EMAIL"),
            api_token: non_empty_var("JIRA_API_TOKEN"),
            api_version: non_empty_var("JIRA_API_VERSION").unwrap_or_else(|| "3".to_string()),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}
