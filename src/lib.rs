/// Error types for the watcher
pub mod error;

/// Log entry and alert category types
pub mod events;

/// Log line decoding and log file following
pub mod collectors;

/// Sliding window of request outcomes
pub mod aggregator;

/// Error classification and pool transition detection
pub mod triggers;

/// Alert cooldowns, payloads and webhook delivery
pub mod alerts;

/// Configuration management
pub mod config;

/// Per-entry processing loop
pub mod driver;

// Re-export commonly used types
pub use config::Config;
pub use driver::{EntryReport, RunSummary, StreamDriver, StreamStats};
pub use error::{AlertError, CollectorError, ConfigError, DecodeError};
pub use events::{AlertCategory, LogEntry, Severity};
