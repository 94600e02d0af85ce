//! Issue tracker integrations.
//!
//! The escalation workflow only needs one thing from a tracker: turn a case
//! URL into an [`IssueSummary`]. [`jira`] is the implementation used by the
//! service.

pub mod jira;

use async_trait::async_trait;

use crate::error::Result;

pub use jira::JiraClient;

/// Case details shown in the pinned channel message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSummary {
    pub key: String,
    pub summary: String,
    pub priority: String,
    pub issue_type: String,
    pub status: String,
}

impl IssueSummary {
    /// Summary carrying only the key, used when the tracker can't be reached.
    #[must_use]
    pub fn placeholder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// Read access to an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Name of the tracker, for logs and status lines.
    fn name(&self) -> &'static str;

    /// Fetch the issue behind a browse URL.
    async fn fetch_issue(&self, issue_url: &str) -> Result<IssueSummary>;
}
