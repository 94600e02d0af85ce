//! Slack slash-command service that escalates a Jira case into a temporary
//! channel.
//!
//! This crate provides:
//! - Slash-command parsing and validation
//! - Jira REST client for case details
//! - Slack Web API client for channels, messages, pins and invites
//! - The escalation workflow that ties them together
//! - HTTP server for the slash-command webhook (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Most client calls are fallible

pub mod command;
pub mod config;
pub mod error;
pub mod escalation;
pub mod messaging;
pub mod naming;
pub mod pm;
pub mod server;
pub mod webhooks;

pub use command::{CommandParser, EscalationCommand, EscalationRequest, ValidationError};
pub use config::Config;
pub use error::{EscalationError, Result};
pub use escalation::{EscalationReport, Orchestrator};
pub use messaging::{Messenger, SlackClient};
pub use pm::{IssueSummary, IssueTracker, JiraClient};
