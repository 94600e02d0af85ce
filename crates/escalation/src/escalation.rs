//! Escalation workflow.
//!
//! One slash command drives a fixed sequence of steps:
//!
//! 1. fetch the case from the issue tracker
//! 2. create the escalation channel
//! 3. have the bot join it
//! 4. post the case summary and pin it
//! 5. invite the tagged users and the requester
//!
//! Each step is attempted once. Every outcome becomes one status line in the
//! [`EscalationReport`], which is returned to Slack whether or not the run
//! got to the end. A tracker failure degrades to a summary holding only the
//! issue key. Channel creation or join failures stop the run. Once the bot has
//! joined, a failed post only skips the pin.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::command::{CommandParser, EscalationCommand, EscalationRequest, ValidationError};
use crate::messaging::{Channel, Messenger};
use crate::naming::escalation_channel_name;
use crate::pm::{IssueSummary, IssueTracker};

/// Workflow steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    FetchIssue,
    CreateChannel,
    JoinChannel,
    SendMessage,
    PinMessage,
    InviteUsers,
    ArchiveChannel,
}

/// Whether a step went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Outcome of one attempted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    pub message: String,
}

impl StepOutcome {
    /// Status line as shown to the requester.
    #[must_use]
    pub fn line(&self) -> String {
        let emoji = match (self.step, self.status) {
            (Step::PinMessage, StepStatus::Succeeded) => ":pushpin:",
            (_, StepStatus::Succeeded) => ":white_check_mark:",
            (Step::CreateChannel, StepStatus::Failed) => ":x:",
            (_, StepStatus::Failed) => ":warning:",
        };
        format!("{emoji} {}", self.message)
    }
}

/// Everything that happened during one escalation.
#[derive(Debug, Clone, Default)]
pub struct EscalationReport {
    /// The channel, once created.
    pub channel: Option<Channel>,
    /// Attempted steps in order.
    pub steps: Vec<StepOutcome>,
}

impl EscalationReport {
    fn record(&mut self, step: Step, status: StepStatus, message: impl Into<String>) {
        self.steps.push(StepOutcome {
            step,
            status,
            message: message.into(),
        });
    }

    fn succeeded(&mut self, step: Step, message: impl Into<String>) {
        self.record(step, StepStatus::Succeeded, message);
    }

    fn failed(&mut self, step: Step, message: impl Into<String>) {
        self.record(step, StepStatus::Failed, message);
    }

    /// Outcome of a step, if it was attempted.
    #[must_use]
    pub fn outcome(&self, step: Step) -> Option<StepStatus> {
        self.steps.iter().find(|s| s.step == step).map(|s| s.status)
    }

    /// Whether any step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Failed)
    }

    fn failed_after_creation(&self) -> bool {
        self.steps
            .iter()
            .any(|s| s.step > Step::CreateChannel && s.status == StepStatus::Failed)
    }

    /// Plain-text response body, one line per step.
    #[must_use]
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(StepOutcome::line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Drives an escalation against a tracker and a messaging platform.
pub struct Orchestrator {
    parser: CommandParser,
    tracker: Arc<dyn IssueTracker>,
    messenger: Arc<dyn Messenger>,
    archive_on_failure: bool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        parser: CommandParser,
        tracker: Arc<dyn IssueTracker>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            parser,
            tracker,
            messenger,
            archive_on_failure: false,
        }
    }

    /// Archive the channel when a step after its creation fails.
    #[must_use]
    pub fn with_archive_on_failure(mut self, enabled: bool) -> Self {
        self.archive_on_failure = enabled;
        self
    }

    /// Parse and validate the command text without calling anything remote.
    pub fn prepare(
        &self,
        request: &EscalationRequest,
    ) -> Result<EscalationCommand, ValidationError> {
        self.parser.parse(&request.text).validate()
    }

    /// Validate the request and run every step.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] before any remote call when `case:` or
    /// `client:` is missing. Remote failures are reported in the
    /// [`EscalationReport`] instead.
    pub async fn escalate(
        &self,
        request: &EscalationRequest,
    ) -> Result<EscalationReport, ValidationError> {
        let command = self.prepare(request)?;
        Ok(self.run(&command, &request.requester_id).await)
    }

    #[instrument(
        skip(self, command),
        fields(
            case_url = %command.case_url,
            client = %command.client_name,
            messenger = self.messenger.name(),
        )
    )]
    async fn run(&self, command: &EscalationCommand, requester_id: &str) -> EscalationReport {
        let mut report = EscalationReport::default();
        let issue_key = self.parser.issue_key(&command.case_url);

        let issue = match self.tracker.fetch_issue(&command.case_url).await {
            Ok(issue) => {
                report.succeeded(
                    Step::FetchIssue,
                    format!("Fetched {} from {}", issue.key, self.tracker.name()),
                );
                issue
            }
            Err(e) => {
                warn!(error = %e, issue_key = %issue_key, "Failed to fetch issue");
                report.failed(
                    Step::FetchIssue,
                    format!(
                        "Could not fetch case details from {}: {e}",
                        self.tracker.name()
                    ),
                );
                IssueSummary::placeholder(issue_key.as_str())
            }
        };

        let channel_name = escalation_channel_name(&issue_key, &command.client_name);
        let channel = match self.messenger.create_channel(&channel_name).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, channel_name = %channel_name, "Failed to create channel");
                report.failed(
                    Step::CreateChannel,
                    format!("Failed to create channel #{channel_name}: {e}"),
                );
                return report;
            }
        };
        report.succeeded(
            Step::CreateChannel,
            format!("Channel created: #{} (ID: {})", channel.name, channel.id),
        );
        report.channel = Some(channel.clone());

        self.finish_in_channel(&channel, &issue, command, requester_id, &mut report)
            .await;

        if self.archive_on_failure && report.failed_after_creation() {
            self.archive(&channel, &mut report).await;
        }

        info!(
            channel_id = %channel.id,
            failed = report.has_failures(),
            "Escalation finished"
        );
        report
    }

    /// Steps that need the channel to exist.
    async fn finish_in_channel(
        &self,
        channel: &Channel,
        issue: &IssueSummary,
        command: &EscalationCommand,
        requester_id: &str,
        report: &mut EscalationReport,
    ) {
        if let Err(e) = self.messenger.join_channel(&channel.id).await {
            warn!(error = %e, channel_id = %channel.id, "Bot failed to join channel");
            report.failed(
                Step::JoinChannel,
                format!("Channel created, but bot failed to join: {e}"),
            );
            return;
        }
        report.succeeded(Step::JoinChannel, "Bot joined the channel");

        match self
            .messenger
            .send_message(&channel.id, issue, &command.case_url)
            .await
        {
            Ok(ts) => {
                report.succeeded(Step::SendMessage, "Case summary posted");
                match self.messenger.pin_message(&channel.id, &ts).await {
                    Ok(()) => report.succeeded(Step::PinMessage, "Case summary pinned"),
                    Err(e) => {
                        warn!(error = %e, "Failed to pin case summary");
                        report.failed(
                            Step::PinMessage,
                            format!("Failed to pin case summary: {e}"),
                        );
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to post case summary");
                report.failed(
                    Step::SendMessage,
                    format!("Failed to post case summary: {e}"),
                );
            }
        }

        match self
            .messenger
            .resolve_and_invite(&channel.id, &command.invite_tags, requester_id)
            .await
        {
            Ok(user_ids) => {
                let mentions = user_ids
                    .iter()
                    .map(|id| format!("<@{id}>"))
                    .collect::<Vec<_>>()
                    .join(", ");
                report.succeeded(
                    Step::InviteUsers,
                    format!("Invited {} user(s): {mentions}", user_ids.len()),
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to invite users");
                report.failed(Step::InviteUsers, format!("Failed to invite users: {e}"));
            }
        }
    }

    async fn archive(&self, channel: &Channel, report: &mut EscalationReport) {
        match self.messenger.archive_channel(&channel.id).await {
            Ok(()) => report.succeeded(
                Step::ArchiveChannel,
                format!("Archived #{} after the failure above", channel.name),
            ),
            Err(e) => report.failed(
                Step::ArchiveChannel,
                format!("Failed to archive #{}: {e}", channel.name),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EscalationError, Result};
    use crate::messaging::Member;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeTracker {
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTracker {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        fn name(&self) -> &'static str {
            "Jira"
        }

        async fn fetch_issue(&self, issue_url: &str) -> Result<IssueSummary> {
            self.calls.lock().unwrap().push(issue_url.to_string());
            if self.fail {
                return Err(EscalationError::remote("timeout"));
            }
            Ok(IssueSummary {
                key: "ABC-123".to_string(),
                summary: "Checkout is down".to_string(),
                priority: "Highest".to_string(),
                issue_type: "Bug".to_string(),
                status: "Open".to_string(),
            })
        }
    }

    /// Records every call; fails the step named in `fail_on`.
    #[derive(Default)]
    struct FakeMessenger {
        fail_on: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeMessenger {
        fn failing(step: &'static str) -> Arc<Self> {
            Arc::new(Self {
                fail_on: Some(step),
                ..Self::default()
            })
        }

        fn call(&self, name: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.fail_on == Some(name) {
                Err(EscalationError::remote(format!("{name}_failed")))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn create_channel(&self, name: &str) -> Result<Channel> {
            self.call("create")?;
            Ok(Channel {
                id: "C1".to_string(),
                name: name.to_string(),
            })
        }

        async fn join_channel(&self, _channel_id: &str) -> Result<()> {
            self.call("join")
        }

        async fn send_message(
            &self,
            _channel_id: &str,
            _issue: &IssueSummary,
            _case_url: &str,
        ) -> Result<String> {
            self.call("send")?;
            Ok("1.0001".to_string())
        }

        async fn pin_message(&self, _channel_id: &str, _timestamp: &str) -> Result<()> {
            self.call("pin")
        }

        async fn list_members(&self) -> Result<Vec<Member>> {
            self.call("list")?;
            Ok(vec![Member {
                id: "U2".to_string(),
                name: "bob".to_string(),
            }])
        }

        async fn invite_users(&self, _channel_id: &str, _user_ids: &[String]) -> Result<()> {
            self.call("invite")
        }

        async fn archive_channel(&self, _channel_id: &str) -> Result<()> {
            self.call("archive")
        }
    }

    fn orchestrator(tracker: Arc<FakeTracker>, messenger: Arc<FakeMessenger>) -> Orchestrator {
        Orchestrator::new(CommandParser::new().unwrap(), tracker, messenger)
    }

    const COMMAND: &str = "case: https://tracker.example/browse/ABC-123 client: Acme invite: @bob";

    #[tokio::test]
    async fn test_missing_case_makes_no_calls() {
        let tracker = FakeTracker::new(false);
        let messenger = Arc::new(FakeMessenger::default());
        let orchestrator = orchestrator(tracker.clone(), messenger.clone());

        let err = orchestrator
            .escalate(&EscalationRequest::new("client: Acme invite: @bob", "U9"))
            .await
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingCase);
        assert!(tracker.calls.lock().unwrap().is_empty());
        assert!(messenger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_client_makes_no_calls() {
        let tracker = FakeTracker::new(false);
        let messenger = Arc::new(FakeMessenger::default());
        let orchestrator = orchestrator(tracker.clone(), messenger.clone());

        let err = orchestrator
            .escalate(&EscalationRequest::new(
                "case: https://tracker.example/browse/ABC-123",
                "U9",
            ))
            .await
            .unwrap_err();

        assert_eq!(err, ValidationError::MissingClient);
        assert!(tracker.calls.lock().unwrap().is_empty());
        assert!(messenger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_happy_path() {
        let messenger = Arc::new(FakeMessenger::default());
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert!(!report.has_failures());
        assert_eq!(
            messenger.calls(),
            vec!["create", "join", "send", "pin", "list", "invite"]
        );
        assert_eq!(
            report.channel.as_ref().map(|c| c.name.as_str()),
            Some("escalation-abc-123-acme-temp")
        );

        let text = report.render();
        assert!(text.contains("Channel created: #escalation-abc-123-acme-temp (ID: C1)"));
        assert!(text.contains("Bot joined the channel"));
        assert!(text.contains("Case summary posted"));
        assert!(text.contains("Case summary pinned"));
        assert!(text.contains("Invited 2 user(s): <@U2>, <@U9>"));
    }

    #[tokio::test]
    async fn test_tracker_failure_still_creates_channel() {
        let messenger = Arc::new(FakeMessenger::default());
        let orchestrator = orchestrator(FakeTracker::new(true), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert_eq!(report.outcome(Step::FetchIssue), Some(StepStatus::Failed));
        assert_eq!(report.outcome(Step::InviteUsers), Some(StepStatus::Succeeded));
        assert!(report
            .render()
            .contains(":warning: Could not fetch case details from Jira: API error: timeout"));
    }

    #[tokio::test]
    async fn test_create_failure_stops_run() {
        let messenger = FakeMessenger::failing("create");
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert_eq!(messenger.calls(), vec!["create"]);
        assert!(report.channel.is_none());
        assert!(report
            .render()
            .contains(":x: Failed to create channel #escalation-abc-123-acme-temp: API error: create_failed"));
    }

    #[tokio::test]
    async fn test_join_failure_stops_run_without_rollback() {
        let messenger = FakeMessenger::failing("join");
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert_eq!(messenger.calls(), vec!["create", "join"]);
        assert!(report.channel.is_some());
        assert!(report
            .render()
            .contains("Channel created, but bot failed to join: API error: join_failed"));
    }

    #[tokio::test]
    async fn test_send_failure_skips_pin_but_invites() {
        let messenger = FakeMessenger::failing("send");
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert_eq!(
            messenger.calls(),
            vec!["create", "join", "send", "list", "invite"]
        );
        assert_eq!(report.outcome(Step::PinMessage), None);
        assert_eq!(report.outcome(Step::InviteUsers), Some(StepStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_pin_failure_is_reported() {
        let messenger = FakeMessenger::failing("pin");
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert_eq!(report.outcome(Step::SendMessage), Some(StepStatus::Succeeded));
        assert_eq!(report.outcome(Step::PinMessage), Some(StepStatus::Failed));
        assert!(report.render().contains("Failed to pin case summary"));
    }

    #[tokio::test]
    async fn test_no_valid_users() {
        let messenger = Arc::new(FakeMessenger::default());
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(
                "case: https://tracker.example/browse/ABC-123 client: Acme invite: @ghost",
                "",
            ))
            .await
            .unwrap();

        assert!(!messenger.calls().contains(&"invite".to_string()));
        assert!(report
            .render()
            .contains("Failed to invite users: no valid users to invite"));
    }

    #[tokio::test]
    async fn test_archive_on_failure() {
        let messenger = FakeMessenger::failing("invite");
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone())
            .with_archive_on_failure(true);

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert_eq!(messenger.calls().last().map(String::as_str), Some("archive"));
        assert_eq!(
            report.outcome(Step::ArchiveChannel),
            Some(StepStatus::Succeeded)
        );
    }

    #[tokio::test]
    async fn test_no_archive_by_default() {
        let messenger = FakeMessenger::failing("invite");
        let orchestrator = orchestrator(FakeTracker::new(false), messenger.clone());

        let report = orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert!(!messenger.calls().contains(&"archive".to_string()));
        assert_eq!(report.outcome(Step::ArchiveChannel), None);
    }

    #[tokio::test]
    async fn test_tracker_failure_alone_does_not_archive() {
        let messenger = Arc::new(FakeMessenger::default());
        let orchestrator = orchestrator(FakeTracker::new(true), messenger.clone())
            .with_archive_on_failure(true);

        orchestrator
            .escalate(&EscalationRequest::new(COMMAND, "U9"))
            .await
            .unwrap();

        assert!(!messenger.calls().contains(&"archive".to_string()));
    }
}
