//! Escalation Ninja service binary.
//!
//! Standalone HTTP service answering the `/ninjaescal` slash command.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use escalation::{config::Config, server, CommandParser, JiraClient, Orchestrator, SlackClient};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("Starting Escalation Ninja...");

    let config = Config::default();

    if config.slack.signing_secret.is_none() {
        warn!("SLACK_SIGNING_SECRET not set - request signatures will not be verified");
    }
    if config.jira.email.is_none() || config.jira.api_token.is_none() {
        warn!("Jira credentials not configured - case details will be unavailable");
    }

    let tracker = JiraClient::new(config.jira.clone(), config.request_timeout)
        .context("Failed to create Jira client")?;
    let messenger = SlackClient::new(config.slack.clone(), config.request_timeout)
        .context("Failed to create Slack client")?;
    let parser = CommandParser::new().context("Failed to compile command patterns")?;

    let orchestrator = Orchestrator::new(parser, Arc::new(tracker), Arc::new(messenger))
        .with_archive_on_failure(config.archive_on_failure);

    if config.archive_on_failure {
        info!("Channels will be archived when an escalation step fails");
    }

    let state = server::AppState {
        config: config.clone(),
        orchestrator: Arc::new(orchestrator),
    };
    let app = server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Escalation Ninja listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Plain text logs by default, JSON with `LOG_FORMAT=json`.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("escalation=info".parse()?);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
    Ok(())
}
