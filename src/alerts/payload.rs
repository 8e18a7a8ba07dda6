//! Alert values and the webhook message they are rendered into
//!
//! The payload follows the Slack incoming-webhook shape: a short banner in
//! `text` and a single attachment carrying color, title, body, detail fields,
//! a fixed runbook field, footer and unix timestamp.

use crate::events::{AlertCategory, Timestamp};
use serde::{Deserialize, Serialize};

/// Maximum length of the attachment body
const MAX_BODY_LENGTH: usize = 3000;

/// Maximum length of a single field value
const MAX_FIELD_LENGTH: usize = 500;

/// A condition worth notifying about
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: AlertCategory,
    /// Human-readable description
    pub message: String,
    /// Ordered (label, value) details
    pub details: Vec<(String, String)>,
}

impl Alert {
    pub fn new(category: AlertCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Append a detail field
    pub fn with_detail(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.details.push((label.into(), value.to_string()));
        self
    }

    /// Look up a detail value by label
    pub fn detail(&self, label: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.as_str())
    }
}

/// Top-level webhook message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookMessage {
    /// Category the message was built for; not sent on the wire
    #[serde(skip, default = "default_category")]
    pub category: AlertCategory,
    pub username: String,
    pub icon_emoji: String,
    /// Short alert-type banner
    pub text: String,
    pub attachments: Vec<Attachment>,
}

fn default_category() -> AlertCategory {
    AlertCategory::Failover
}

/// Structured part of the message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub color: String,
    pub title: String,
    pub text: String,
    pub fields: Vec<Field>,
    pub footer: String,
    /// Delivery time as unix seconds
    pub ts: i64,
}

/// One (label, value) detail row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// Renders alerts into webhook messages
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    username: String,
    icon_emoji: String,
    footer: String,
    runbook_hint: String,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new(
            "poolwatch",
            ":robot_face:",
            "See runbook.md for response procedures",
        )
    }
}

impl PayloadBuilder {
    /// # Arguments
    ///
    /// * `username` - Display name the message is posted under
    /// * `icon_emoji` - Avatar emoji
    /// * `runbook_hint` - Value of the fixed "Action" field
    pub fn new(
        username: impl Into<String>,
        icon_emoji: impl Into<String>,
        runbook_hint: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            footer: format!("{} - Proxy Alert Watcher", username),
            username,
            icon_emoji: icon_emoji.into(),
            runbook_hint: runbook_hint.into(),
        }
    }

    /// Build the message for an alert delivered at `now`
    pub fn build(&self, alert: &Alert, now: Timestamp) -> WebhookMessage {
        let mut fields: Vec<Field> = alert
            .details
            .iter()
            .map(|(title, value)| Field {
                title: title.clone(),
                value: truncate_text(value, MAX_FIELD_LENGTH),
                short: true,
            })
            .collect();

        fields.push(Field {
            title: "Action".to_string(),
            value: self.runbook_hint.clone(),
            short: false,
        });

        WebhookMessage {
            category: alert.category,
            username: self.username.clone(),
            icon_emoji: self.icon_emoji.clone(),
            text: format!(":warning: *{}*", alert.category.banner()),
            attachments: vec![Attachment {
                color: alert.category.color().to_string(),
                title: alert.category.title(),
                text: truncate_text(&alert.message, MAX_BODY_LENGTH),
                fields,
                footer: self.footer.clone(),
                ts: now.timestamp(),
            }],
        }
    }
}

/// Truncate text to at most `max_length` bytes, ending with "..."
///
/// Cuts on a UTF-8 character boundary.
fn truncate_text(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        return text.to_string();
    }

    let mut cut = max_length.saturating_sub(3);
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}
