//! Jira integration.
//!
//! Resolves a browse URL such as `https://acme.atlassian.net/browse/ABC-123`
//! into the REST endpoint `https://acme.atlassian.net/rest/api/3/issue/ABC-123`
//! and reads the fields the escalation message needs.
//!
//! # Example
//!
//! ```no_run
//! use escalation::config::JiraConfig;
//! use escalation::pm::{IssueTracker, JiraClient};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = JiraClient::new(JiraConfig::default(), Duration::from_secs(10))?;
//! let issue = client
//!     .fetch_issue("https://acme.atlassian.net/browse/ABC-123")
//!     .await?;
//! println!("{}: {}", issue.key, issue.summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `JIRA_EMAIL`: Account email for basic auth
//! - `JIRA_API_TOKEN`: Jira API token
//! - `JIRA_API_VERSION`: REST API version (default `3`)

mod client;
mod models;

pub use client::JiraClient;
pub use models::{JiraFields, JiraIssue, NamedField};
