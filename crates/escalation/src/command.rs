//! Slash-command argument parsing.
//!
//! Expected input (segments may appear in any order):
//!
//! ```text
//! case: https://acme.atlassian.net/browse/ABC-123 client: Acme invite: @alice @bob
//! ```

use regex::Regex;
use thiserror::Error;

/// Slash commands this service answers to.
pub const ACCEPTED_COMMANDS: [&str; 2] = ["/ninjaescal", "/ninjaescalate"];

/// Issue key used when the case URL has no `/browse/<KEY>` segment.
pub const NO_CASE: &str = "no-case";

/// Labels that open a segment in the command text.
const SEGMENT_LABELS: [&str; 3] = ["case:", "client:", "invite:"];

/// Check whether a slash-command name is one this service handles.
#[must_use]
pub fn is_escalation_command(command: &str) -> bool {
    ACCEPTED_COMMANDS.contains(&command.trim())
}

/// One inbound slash-command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationRequest {
    /// Raw `text` field of the slash command.
    pub text: String,
    /// Slack user id of whoever ran the command.
    pub requester_id: String,
}

impl EscalationRequest {
    #[must_use]
    pub fn new(text: impl Into<String>, requester_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            requester_id: requester_id.into(),
        }
    }
}

/// Missing required input in the command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields: `case:`")]
    MissingCase,
    #[error("Missing required fields: `client:`")]
    MissingClient,
}

/// Fields extracted from the command text. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub case_url: Option<String>,
    pub client_name: Option<String>,
    pub invite_tags: Vec<String>,
}

impl ParsedCommand {
    /// Check the required segments are present.
    ///
    /// `case:` is checked before `client:`, so a command missing both reports the case.
    pub fn validate(self) -> Result<EscalationCommand, ValidationError> {
        let case_url = self.case_url.ok_or(ValidationError::MissingCase)?;
        let client_name = self.client_name.ok_or(ValidationError::MissingClient)?;
        Ok(EscalationCommand {
            case_url,
            client_name,
            invite_tags: self.invite_tags,
        })
    }
}

/// A command with both required segments present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationCommand {
    pub case_url: String,
    pub client_name: String,
    pub invite_tags: Vec<String>,
}

/// Compiled patterns for the command text and case URLs.
#[derive(Debug, Clone)]
pub struct CommandParser {
    case: Regex,
    client: Regex,
    invite: Regex,
    issue_key: Regex,
}

impl CommandParser {
    /// Compile the parser patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            case: Regex::new(r"(?:^|\s)case:\s*(https?://\S+)")?,
            client: Regex::new(r"(?:^|\s)client:\s*(\S+)")?,
            invite: Regex::new(r"(?:^|\s)invite:[ \t]*(.*)")?,
            issue_key: Regex::new(r"/browse/([^/?#\s]+)")?,
        })
    }

    /// Extract the labelled segments from the command text.
    #[must_use]
    pub fn parse(&self, text: &str) -> ParsedCommand {
        let capture = |re: &Regex| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        // `client:` directly followed by another label means the name was left out.
        let client_name = capture(&self.client).filter(|name| !starts_with_label(name));

        let invite_tags = capture(&self.invite)
            .map(|rest| {
                rest.split_whitespace()
                    .take_while(|token| !starts_with_label(token))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ParsedCommand {
            case_url: capture(&self.case),
            client_name,
            invite_tags,
        }
    }

    /// Derive the issue key from a case URL, falling back to [`NO_CASE`].
    #[must_use]
    pub fn issue_key(&self, case_url: &str) -> String {
        self.issue_key
            .captures(case_url)
            .and_then(|caps| caps.get(1))
            .map_or_else(|| NO_CASE.to_string(), |m| m.as_str().to_string())
    }
}

fn starts_with_label(token: &str) -> bool {
    SEGMENT_LABELS.iter().any(|label| token.starts_with(label))
}
