//! Case summary message formatting (Block Kit).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pm::IssueSummary;

/// Placeholder shown for fields the tracker left empty.
const EMPTY_FIELD: &str = "n/a";

/// `chat.postMessage` body.
#[derive(Debug, Serialize)]
pub struct SlackMessagePayload {
    pub channel: String,
    /// Fallback for notifications and clients without Block Kit.
    pub text: String,
    pub blocks: Vec<SlackBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Section block with text
    Section { text: SlackText },
    /// Divider line
    Divider,
    /// Context block for metadata
    Context { elements: Vec<SlackText> },
}

#[derive(Debug, Serialize)]
pub struct SlackText {
    #[serde(rename = "type")]
    text_type: &'static str,
    pub text: String,
}

impl SlackText {
    fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn",
            text: text.into(),
        }
    }
}

/// Build the welcome message posted (and pinned) in a new escalation channel.
#[must_use]
pub fn format_summary_payload(
    channel_id: &str,
    issue: &IssueSummary,
    case_url: &str,
    now: DateTime<Utc>,
) -> SlackMessagePayload {
    let label = if issue.key.is_empty() {
        case_url
    } else {
        issue.key.as_str()
    };
    let link = format!("<{}|{}>", case_url, escape(label));
    let priority = field(&issue.priority);
    let issue_type = field(&issue.issue_type);
    let status = field(&issue.status);
    let summary = field(&issue.summary);

    let text = format!(
        ":ninja: Escalation-Ninja welcomes you in this Escalation Channel!\n\n\
         :link: *Escalation for:* {link}\n\
         :rotating_light: *Priority:* `{priority}`\n\
         :label: *Type:* `{issue_type}`\n\
         :bar_chart: *Status:* `{status}`\n\
         :memo: *Summary:* {summary}"
    );

    let blocks = vec![
        SlackBlock::Section {
            text: SlackText::mrkdwn(
                ":ninja: *Escalation-Ninja welcomes you in this Escalation Channel!*",
            ),
        },
        SlackBlock::Section {
            text: SlackText::mrkdwn(format!(":link: *Escalation for:* {link}")),
        },
        SlackBlock::Divider,
        SlackBlock::Section {
            text: SlackText::mrkdwn(
                [
                    format!(":rotating_light: *Priority:* `{priority}`"),
                    format!(":label: *Type:* `{issue_type}`"),
                    format!(":bar_chart: *Status:* `{status}`"),
                ]
                .join(" • "),
            ),
        },
        SlackBlock::Section {
            text: SlackText::mrkdwn(format!(":memo: *Summary:* {summary}")),
        },
        SlackBlock::Context {
            elements: vec![SlackText::mrkdwn(format!(
                "Escalation Ninja • {}",
                now.format("%Y-%m-%d %H:%M:%S UTC")
            ))],
        },
    ];

    SlackMessagePayload {
        channel: channel_id.to_string(),
        text,
        blocks,
    }
}

fn field(value: &str) -> String {
    if value.trim().is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        escape(value)
    }
}

/// Escape the characters Slack treats as control sequences in mrkdwn.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
