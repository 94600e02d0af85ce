//! Error types shared by the tracker client, the Slack client and the workflow.

use thiserror::Error;

use crate::command::ValidationError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EscalationError>;

/// Errors that can occur while escalating a case.
#[derive(Debug, Error)]
pub enum EscalationError {
    /// The slash-command input is missing a required segment.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A credential needed for the call is not configured.
    #[error("{0} not configured")]
    Auth(&'static str),

    /// The remote API rejected the call or could not be reached.
    #[error("API error: {reason}")]
    Remote {
        /// Reason reported by the remote side (or `timeout`).
        reason: String,
    },

    /// The case URL does not have the `scheme://host/browse/KEY` shape.
    #[error("invalid Jira URL format: {0}")]
    MalformedUrl(String),

    /// Nobody could be resolved for the invite call.
    #[error("no valid users to invite")]
    NoValidUsers,
}

impl EscalationError {
    /// Build a remote error from any displayable reason.
    pub fn remote(reason: impl Into<String>) -> Self {
        Self::Remote {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for EscalationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::remote("timeout")
        } else if err.is_decode() {
            Self::remote(format!("malformed response: {err}"))
        } else {
            Self::remote(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EscalationError {
    fn from(err: serde_json::Error) -> Self {
        Self::remote(format!("malformed response: {err}"))
    }
}
