//! Team messaging integrations.
//!
//! The escalation workflow drives a messaging platform through the
//! [`Messenger`] trait. [`slack`] implements it against the Slack Web API.
//!
//! Invite resolution lives here because it is platform independent: given the
//! workspace member list, display tags like `@alice` are mapped to member ids,
//! the requester is always added, and duplicates are dropped.

pub mod slack;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{EscalationError, Result};
use crate::pm::IssueSummary;

pub use slack::SlackClient;

/// A channel created by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

/// A workspace member as returned by the member listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Messaging platform operations used by the escalation workflow.
///
/// Each call is independent and individually fallible. Calls against a
/// channel the bot has not joined fail at the remote side.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Name of the platform, for logs.
    fn name(&self) -> &'static str;

    /// Create a channel and return it.
    async fn create_channel(&self, name: &str) -> Result<Channel>;

    /// Have the bot account join a channel.
    async fn join_channel(&self, channel_id: &str) -> Result<()>;

    /// Post the case summary message, returning its timestamp.
    async fn send_message(
        &self,
        channel_id: &str,
        issue: &IssueSummary,
        case_url: &str,
    ) -> Result<String>;

    /// Pin a message by its timestamp.
    async fn pin_message(&self, channel_id: &str, timestamp: &str) -> Result<()>;

    /// List every member of the workspace.
    async fn list_members(&self) -> Result<Vec<Member>>;

    /// Invite the given member ids to a channel in a single call.
    async fn invite_users(&self, channel_id: &str, user_ids: &[String]) -> Result<()>;

    /// Archive a channel.
    async fn archive_channel(&self, channel_id: &str) -> Result<()>;

    /// Resolve display tags and invite them plus the requester.
    ///
    /// A failed member listing is logged and treated as an empty directory,
    /// so the requester is still invited.
    async fn resolve_and_invite(
        &self,
        channel_id: &str,
        tags: &[String],
        requester_id: &str,
    ) -> Result<Vec<String>> {
        let directory = match self.list_members().await {
            Ok(members) => member_directory(members),
            Err(e) => {
                warn!(error = %e, "Failed to list workspace members");
                HashMap::new()
            }
        };

        let user_ids = resolve_invitees(tags, &directory, requester_id)?;
        self.invite_users(channel_id, &user_ids).await?;
        Ok(user_ids)
    }
}

/// Build the member-name to member-id lookup.
#[must_use]
pub fn member_directory(members: Vec<Member>) -> HashMap<String, String> {
    members
        .into_iter()
        .filter(|m| !m.name.is_empty())
        .map(|m| (m.name, m.id))
        .collect()
}

/// Resolve one display tag to a member id.
///
/// `@name` is looked up by exact name. Escaped mentions (`<@U123>` or
/// `<@U123|name>`) already carry the id.
#[must_use]
pub fn resolve_tag(tag: &str, directory: &HashMap<String, String>) -> Option<String> {
    if let Some(inner) = tag.strip_prefix("<@").and_then(|t| t.strip_suffix('>')) {
        let id = inner.split('|').next().unwrap_or_default();
        return (!id.is_empty()).then(|| id.to_string());
    }

    let name = tag.strip_prefix('@').unwrap_or(tag);
    directory.get(name).cloned()
}

/// Compute the ordered, de-duplicated set of ids to invite.
///
/// Unresolved tags are dropped with a warning. The requester is always
/// included unless blank.
///
/// # Errors
/// Returns [`EscalationError::NoValidUsers`] when nothing is left to invite.
pub fn resolve_invitees(
    tags: &[String],
    directory: &HashMap<String, String>,
    requester_id: &str,
) -> Result<Vec<String>> {
    let mut user_ids: Vec<String> = Vec::new();

    for tag in tags {
        match resolve_tag(tag, directory) {
            Some(id) if !user_ids.contains(&id) => user_ids.push(id),
            Some(_) => {}
            None => warn!(tag = %tag, "No workspace member found for tag"),
        }
    }

    let requester_id = requester_id.trim();
    if !requester_id.is_empty() && !user_ids.iter().any(|id| id == requester_id) {
        user_ids.push(requester_id.to_string());
    }

    if user_ids.is_empty() {
        return Err(EscalationError::NoValidUsers);
    }

    debug!(user_ids = ?user_ids, "Resolved invitees");
    Ok(user_ids)
}
