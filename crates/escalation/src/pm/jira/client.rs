//! Jira REST client.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, instrument, warn};

use super::models::JiraIssue;
use crate::config::JiraConfig;
use crate::error::{EscalationError, Result};
use crate::pm::{IssueSummary, IssueTracker};

/// Jira client authenticated with an account email and API token.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    email: Option<String>,
    api_token: Option<String>,
    api_version: String,
    browse_url: Regex,
}

impl JiraClient {
    /// Create a new Jira client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: JiraConfig, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build Jira HTTP client")?;

        let browse_url = Regex::new(r"^(https?://[^/\s]+)/browse/([^/?#\s]+)/?(?:[?#]\S*)?$")
            .context("Invalid browse URL pattern")?;

        Ok(Self {
            client,
            email: config.email,
            api_token: config.api_token,
            api_version: config.api_version,
            browse_url,
        })
    }

    /// Build the REST endpoint for a browse URL, keeping scheme and host.
    ///
    /// # Errors
    /// Returns [`EscalationError::MalformedUrl`] unless the URL looks like
    /// `scheme://host/browse/KEY`.
    pub fn api_url(&self, issue_url: &str) -> Result<String> {
        let caps = self
            .browse_url
            .captures(issue_url.trim())
            .ok_or_else(|| EscalationError::MalformedUrl(issue_url.to_string()))?;

        Ok(format!(
            "{}/rest/api/{}/issue/{}",
            &caps[1], self.api_version, &caps[2]
        ))
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let email = self
            .email
            .as_deref()
            .ok_or(EscalationError::Auth("JIRA_EMAIL"))?;
        let token = self
            .api_token
            .as_deref()
            .ok_or(EscalationError::Auth("JIRA_API_TOKEN"))?;
        Ok((email, token))
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    fn name(&self) -> &'static str {
        "Jira"
    }

    #[instrument(skip(self))]
    async fn fetch_issue(&self, issue_url: &str) -> Result<IssueSummary> {
        let api_url = self.api_url(issue_url)?;
        let (email, token) = self.credentials()?;

        debug!(api_url = %api_url, "Fetching issue from Jira");

        let response = self
            .client
            .get(&api_url)
            .basic_auth(email, Some(token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Jira API request failed");
            return Err(EscalationError::remote(format!("Jira returned {status}")));
        }

        let body = response.bytes().await?;
        let issue: JiraIssue = serde_json::from_slice(&body)?;

        debug!(key = %issue.key, "Retrieved issue from Jira");
        Ok(issue.into())
    }
}
