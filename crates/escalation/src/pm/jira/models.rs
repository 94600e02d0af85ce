//! Jira REST payloads.

use serde::Deserialize;

use crate::pm::IssueSummary;

/// The subset of `GET /rest/api/<version>/issue/<KEY>` we read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JiraIssue {
    pub key: String,
    pub fields: JiraFields,
}

/// Issue fields. Any of them may be missing or `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JiraFields {
    pub summary: Option<String>,
    pub priority: Option<NamedField>,
    #[serde(rename = "issuetype")]
    pub issue_type: Option<NamedField>,
    pub status: Option<NamedField>,
}

/// Jira objects that are only interesting for their `name`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedField {
    pub name: Option<String>,
}

fn name_of(field: Option<NamedField>) -> String {
    field.and_then(|f| f.name).unwrap_or_default()
}

impl From<JiraIssue> for IssueSummary {
    fn from(issue: JiraIssue) -> Self {
        let fields = issue.fields;
        Self {
            key: issue.key,
            summary: fields.summary.unwrap_or_default(),
            priority: name_of(fields.priority),
            issue_type: name_of(fields.issue_type),
            status: name_of(fields.status),
        }
    }
}
