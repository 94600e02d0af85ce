//! HTTP server for the escalation slash command.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::escalation::Orchestrator;
use crate::webhooks::{
    validate_request_timestamp, verify_slack_signature, SlashCommand, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Config,
    /// Escalation workflow.
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the HTTP router for the escalation service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/slack/command", post(slash_command_handler))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Ready once Slack calls can be authenticated.
async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    if state.config.slack.bot_token.is_none() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(json!({ "status": "ready" })))
}

/// Handle an incoming slash command.
///
/// This handler:
/// 1. Verifies the request signature (if a signing secret is configured)
/// 2. Rejects commands other than the escalation ones with 403
/// 3. Runs the escalation and answers with one status line per step
pub async fn slash_command_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.config.slack.signing_secret {
        if let Err(status) =
            check_signature(&headers, &body, secret, state.config.slack.max_timestamp_age_secs)
        {
            return status.into_response();
        }
        debug!("Slack signature verified");
    }

    let command: SlashCommand = match serde_urlencoded::from_bytes(&body) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Failed to parse slash command form");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    info!(
        command = %command.command,
        user_id = %command.user_id,
        team_domain = %command.team_domain,
        channel_name = %command.channel_name,
        "Received slash command"
    );

    if !command.is_escalation() {
        warn!(command = %command.command, "Rejected unknown slash command");
        return (StatusCode::FORBIDDEN, "Invalid Command").into_response();
    }

    match state.orchestrator.escalate(&command.to_request()).await {
        Ok(report) => report.render().into_response(),
        Err(e) => {
            info!(reason = %e, "Slash command rejected before any remote call");
            format!(":warning: {e}").into_response()
        }
    }
}

fn check_signature(
    headers: &HeaderMap,
    body: &[u8],
    secret: &str,
    max_age_secs: i64,
) -> Result<(), StatusCode> {
    let (Some(timestamp), Some(signature)) = (
        header_str(headers, TIMESTAMP_HEADER),
        header_str(headers, SIGNATURE_HEADER),
    ) else {
        warn!("Missing Slack signature headers");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let fresh = timestamp
        .parse::<i64>()
        .is_ok_and(|ts| validate_request_timestamp(ts, max_age_secs));
    if !fresh {
        warn!(timestamp = %timestamp, "Stale or invalid Slack request timestamp");
        return Err(StatusCode::UNAUTHORIZED);
    }

    if !verify_slack_signature(body, timestamp, signature, secret) {
        warn!("Invalid Slack signature");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
