//! Per-entry processing loop
//!
//! [`StreamDriver`] owns every piece of detection state: the outcome window,
//! the pool tracker, the alert dispatcher and the running counters. Entries
//! are processed strictly in arrival order on the calling thread.

use crate::aggregator::OutcomeWindow;
use crate::alerts::{Alert, AlertDispatcher, DispatchOutcome};
use crate::collectors::{decode_line, LineSource, SourcePoll};
use crate::config::Config;
use crate::error::CollectorError;
use crate::events::{AlertCategory, LogEntry, Timestamp};
use crate::triggers::{is_error_entry, Failover, PoolTracker, Recovery};
use chrono::Utc;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// What one entry did to the detection state
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    /// Whether the entry counted as a server error
    pub is_error: bool,
    /// Alerts raised by the entry, in dispatch order
    pub dispatched: Vec<(AlertCategory, DispatchOutcome)>,
    /// Whether the entry completed a summary interval
    pub summarized: bool,
}

impl EntryReport {
    /// Outcome of the alert of this category, if one was raised
    pub fn outcome(&self, category: AlertCategory) -> Option<&DispatchOutcome> {
        self.dispatched
            .iter()
            .find(|(fired, _)| *fired == category)
            .map(|(_, outcome)| outcome)
    }

    pub fn fired(&self, category: AlertCategory) -> bool {
        self.outcome(category).is_some()
    }

    /// Categories raised by the entry, in dispatch order
    pub fn categories(&self) -> Vec<AlertCategory> {
        self.dispatched.iter().map(|(category, _)| *category).collect()
    }
}

/// Snapshot of the running counters
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStats {
    pub total_requests: u64,
    pub total_errors: u64,
    /// Lines dropped because they could not be decoded
    pub skipped_lines: u64,
    /// Health-check requests ignored
    pub healthchecks: u64,
    pub last_pool: String,
    /// Error rate over the current window, in percent
    pub window_rate: f64,
    pub window_len: usize,
}

/// Result of a [`StreamDriver::run`] that ended on shutdown
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Raw lines pulled from the source
    pub lines_read: u64,
    pub stats: StreamStats,
}

pub struct StreamDriver {
    window: OutcomeWindow,
    tracker: PoolTracker,
    dispatcher: AlertDispatcher,
    /// Error rate (percent) that must be exceeded
    threshold: f64,
    poll_interval: Duration,
    summary_interval: u64,
    total_requests: u64,
    total_errors: u64,
    skipped_lines: u64,
    healthchecks: u64,
}

impl StreamDriver {
    /// Build a driver from validated configuration
    pub fn new(config: &Config, dispatcher: AlertDispatcher) -> Self {
        Self {
            window: OutcomeWindow::new(config.detection.window_size),
            tracker: PoolTracker::new(config.detection.active_pool.clone()),
            dispatcher,
            threshold: config.detection.error_rate_threshold,
            poll_interval: Duration::from_millis(config.source.poll_interval_ms),
            summary_interval: config.source.summary_interval.max(1),
            total_requests: 0,
            total_errors: 0,
            skipped_lines: 0,
            healthchecks: 0,
        }
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            total_requests: self.total_requests,
            total_errors: self.total_errors,
            skipped_lines: self.skipped_lines,
            healthchecks: self.healthchecks,
            last_pool: self.tracker.last_pool().to_string(),
            window_rate: self.window.rate(),
            window_len: self.window.len(),
        }
    }

    /// Decode and process one raw line
    ///
    /// Returns `None` for health checks and for lines that do not decode;
    /// neither touches the request counters or the window.
    pub fn process_line(&mut self, line: &str) -> Option<EntryReport> {
        self.process_line_at(line, Utc::now())
    }

    pub fn process_line_at(&mut self, line: &str, now: Timestamp) -> Option<EntryReport> {
        match decode_line(line) {
            Ok(Some(entry)) => Some(self.process_entry_at(&entry, now)),
            Ok(None) => {
                self.healthchecks += 1;
                None
            }
            Err(e) => {
                self.skipped_lines += 1;
                warn!("[skipped] Could not decode line ({}): {}", e, line);
                None
            }
        }
    }

    /// Process one decoded entry at the current time
    pub fn process_entry(&mut self, entry: &LogEntry) -> EntryReport {
        self.process_entry_at(entry, Utc::now())
    }

    /// Process one decoded entry as if the current time were `now`
    ///
    /// Alerts are dispatched in a fixed order: failover, recovery, then
    /// error rate. The error-rate check only runs once the window is full.
    pub fn process_entry_at(&mut self, entry: &LogEntry, now: Timestamp) -> EntryReport {
        self.total_requests += 1;
        let is_error = is_error_entry(entry);
        if is_error {
            self.total_errors += 1;
        }
        self.window.push(is_error);

        let transition = self.tracker.observe(entry.observed_pool());
        let mut dispatched = Vec::new();

        if let Some(failover) = transition.failover {
            let alert = self.failover_alert(&failover, now);
            dispatched.push((AlertCategory::Failover, self.dispatcher.notify_at(&alert, now)));
        }

        if let Some(recovery) = transition.recovery {
            let alert = self.recovery_alert(&recovery, now);
            dispatched.push((AlertCategory::Recovery, self.dispatcher.notify_at(&alert, now)));
        }

        if self.window.is_full() {
            let rate = self.window.rate();
            if rate > self.threshold {
                let alert = self.error_rate_alert(rate, now);
                dispatched.push((AlertCategory::ErrorRate, self.dispatcher.notify_at(&alert, now)));
            }
        }

        let summarized = self.total_requests % self.summary_interval == 0;
        if summarized {
            info!(
                "Processed {} requests | errors: {} | pool: {} | window error rate: {:.2}%",
                self.total_requests,
                self.total_errors,
                entry.observed_pool().unwrap_or("-"),
                self.window.rate()
            );
        }

        EntryReport {
            is_error,
            dispatched,
            summarized,
        }
    }

    /// Pull lines from `source` until `shutdown` is set
    ///
    /// Sleeps for the poll interval whenever the source has nothing new.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError` if the source fails; detection state is
    /// discarded either way.
    pub fn run<S: LineSource>(
        &mut self,
        source: &mut S,
        shutdown: &AtomicBool,
    ) -> Result<RunSummary, CollectorError> {
        let mut lines_read = 0u64;

        while !shutdown.load(Ordering::SeqCst) {
            match source.next_line()? {
                SourcePoll::Line(line) => {
                    lines_read += 1;
                    self.process_line(&line);
                }
                SourcePoll::Pending => std::thread::sleep(self.poll_interval),
            }
        }

        let stats = self.stats();
        info!(
            "Shutting down after {} requests ({} errors, {} skipped lines, {} health checks)",
            stats.total_requests, stats.total_errors, stats.skipped_lines, stats.healthchecks
        );

        Ok(RunSummary { lines_read, stats })
    }

    fn failover_alert(&self, failover: &Failover, now: Timestamp) -> Alert {
        Alert::new(
            AlertCategory::Failover,
            format!(
                "Traffic has failed over from *{}* pool to *{}* pool.",
                failover.previous, failover.current
            ),
        )
        .with_detail("Previous Pool", &failover.previous)
        .with_detail("Current Pool", &failover.current)
        .with_detail("Total Requests", self.total_requests)
        .with_detail("Timestamp", now.format(TIMESTAMP_FORMAT))
    }

    fn recovery_alert(&self, recovery: &Recovery, now: Timestamp) -> Alert {
        Alert::new(
            AlertCategory::Recovery,
            format!(
                "Primary pool *{}* has recovered and is now serving traffic.",
                recovery.pool
            ),
        )
        .with_detail("Pool", &recovery.pool)
        .with_detail("Total Requests", self.total_requests)
        .with_detail("Timestamp", now.format(TIMESTAMP_FORMAT))
    }

    fn error_rate_alert(&self, rate: f64, now: Timestamp) -> Alert {
        Alert::new(
            AlertCategory::ErrorRate,
            format!(
                "Error rate has exceeded threshold: *{:.2}%* (threshold: {}%)",
                rate, self.threshold
            ),
        )
        .with_detail("Error Rate", format!("{:.2}%", rate))
        .with_detail("Threshold", format!("{}%", self.threshold))
        .with_detail("Window Size", format!("{} requests", self.window.capacity()))
        .with_detail("Current Pool", self.tracker.last_pool())
        .with_detail("Timestamp", now.format(TIMESTAMP_FORMAT))
    }
}
