//! Core event types shared across the watcher
//!
//! This module defines the decoded log entry, the closed set of alert
//! categories and the severity scale used to present them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// Placeholder the proxy writes for a field it has no value for
pub const PLACEHOLDER: &str = "-";

/// A single decoded access-log entry
///
/// The fields consumed by the detection engine are named; every other
/// `key=value` pair on the line is kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    /// Pool that served the request (e.g. "blue", "green")
    pub pool: Option<String>,
    /// Final status code returned to the client
    pub status: Option<String>,
    /// Status code returned by the upstream
    pub upstream_status: Option<String>,
    /// Request URI
    pub uri: Option<String>,
    /// Unrecognized fields, passed through unused
    pub extra: BTreeMap<String, String>,
}

impl LogEntry {
    /// Store a decoded field, routing recognized keys to their named slot
    pub fn set_field(&mut self, key: &str, value: String) {
        match key {
            "pool" => self.pool = Some(value),
            "status" => self.status = Some(value),
            "upstream_status" => self.upstream_status = Some(value),
            "uri" => self.uri = Some(value),
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Pool value if it is present and not the placeholder
    pub fn observed_pool(&self) -> Option<&str> {
        self.pool
            .as_deref()
            .filter(|pool| !pool.is_empty() && *pool != PLACEHOLDER)
    }
}

/// Severity level attached to each alert category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// May require attention
    Warning,
    /// Requires immediate attention
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of conditions the watcher alerts on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    /// Traffic moved from one pool to another
    Failover,
    /// Windowed error rate above threshold
    ErrorRate,
    /// Traffic returned to the configured active pool
    Recovery,
}

impl AlertCategory {
    /// Every category, in dispatch order
    pub const ALL: [AlertCategory; 3] = [
        AlertCategory::Failover,
        AlertCategory::ErrorRate,
        AlertCategory::Recovery,
    ];

    /// Stable identifier (`failover`, `error_rate`, `recovery`)
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Failover => "failover",
            AlertCategory::ErrorRate => "error_rate",
            AlertCategory::Recovery => "recovery",
        }
    }

    /// Position in [`AlertCategory::ALL`]
    pub fn index(&self) -> usize {
        match self {
            AlertCategory::Failover => 0,
            AlertCategory::ErrorRate => 1,
            AlertCategory::Recovery => 2,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertCategory::Failover => Severity::Warning,
            AlertCategory::ErrorRate => Severity::Critical,
            AlertCategory::Recovery => Severity::Info,
        }
    }

    /// Attachment color used by the webhook payload
    pub fn color(&self) -> &'static str {
        match self {
            AlertCategory::Failover => "#FF9800",
            AlertCategory::ErrorRate => "#F44336",
            AlertCategory::Recovery => "#4CAF50",
        }
    }

    /// Title shown on the notification, e.g. "Error Rate Detected"
    pub fn title(&self) -> String {
        let words: Vec<String> = self
            .as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect();
        format!("{} Detected", words.join(" "))
    }

    /// Short banner line, e.g. "FAILOVER ALERT"
    pub fn banner(&self) -> String {
        format!("{} ALERT", self.as_str().to_uppercase())
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
