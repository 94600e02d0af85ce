//! Escalation channel naming.

/// Characters Slack rejects in channel names that we map to `-`.
const REPLACED_CHARS: [char; 6] = ['_', '.', '@', '#', ':', ' '];

/// Map a proposed name onto Slack's channel-name alphabet.
///
/// Lower-cases and replaces `_ . @ # :` and spaces with `-`. Length and
/// repeated dashes are left alone, so Slack can still reject very long names.
#[must_use]
pub fn sanitize_channel_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if REPLACED_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Build the sanitized escalation channel name for a case and client.
#[must_use]
pub fn escalation_channel_name(issue_key: &str, client_name: &str) -> String {
    sanitize_channel_name(&format!("escalation-{issue_key}-{client_name}-temp"))
}
