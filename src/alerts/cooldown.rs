use crate::events::{AlertCategory, Timestamp};
use chrono::{Duration, Utc};

/// Default minimum time between two deliveries of the same category
pub const DEFAULT_COOLDOWN_SECONDS: i64 = 300;

/// Per-category record of the last successfully delivered alert
///
/// Only confirmed deliveries are recorded, so a failed delivery never starts
/// a cooldown. Entries are never cleared for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct AlertLedger {
    /// Minimum spacing between deliveries of one category
    cooldown: Duration,
    /// Last delivery per category, indexed by [`AlertCategory::index`]
    last_delivered: [Option<Timestamp>; 3],
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECONDS))
    }
}

impl AlertLedger {
    /// Create an empty ledger with the given cooldown
    ///
    /// # Arguments
    ///
    /// * `cooldown` - Minimum time between deliveries of the same category
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_delivered: [None; 3],
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// When this category was last delivered, if ever
    pub fn last_delivered(&self, category: AlertCategory) -> Option<Timestamp> {
        self.last_delivered[category.index()]
    }

    /// Time left before the category may be delivered again
    ///
    /// Returns `None` when the category is free to send at `now`, including
    /// when it has never been delivered.
    pub fn remaining_at(&self, category: AlertCategory, now: Timestamp) -> Option<Duration> {
        let last = self.last_delivered(category)?;
        let elapsed = now - last;
        if elapsed < self.cooldown {
            Some(self.cooldown - elapsed)
        } else {
            None
        }
    }

    /// Check whether the category can be delivered now
    pub fn can_send(&self, category: AlertCategory) -> bool {
        self.remaining_at(category, Utc::now()).is_none()
    }

    /// Record a confirmed delivery at the given time
    pub fn record_delivery_at(&mut self, category: AlertCategory, timestamp: Timestamp) {
        self.last_delivered[category.index()] = Some(timestamp);
    }

    /// Record a confirmed delivery at the current time
    pub fn record_delivery(&mut self, category: AlertCategory) {
        self.record_delivery_at(category, Utc::now());
    }
}
