//! Slack Web API request and response bodies.

use serde::{Deserialize, Serialize};

use crate::messaging::{Channel, Member};

#[derive(Debug, Serialize)]
pub(super) struct CreateChannelRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct ChannelRequest<'a> {
    pub channel: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PinRequest<'a> {
    pub channel: &'a str,
    pub timestamp: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct InviteRequest<'a> {
    pub channel: &'a str,
    /// Comma-separated member ids.
    pub users: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateChannelResponse {
    pub channel: Channel,
}

#[derive(Debug, Deserialize)]
pub(super) struct PostMessageResponse {
    pub ts: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Body for methods whose only useful response field is `ok`.
#[derive(Debug, Deserialize)]
pub(super) struct Empty {}
