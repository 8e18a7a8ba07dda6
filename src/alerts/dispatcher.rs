use crate::alerts::cooldown::AlertLedger;
use crate::alerts::notifier::Notifier;
use crate::alerts::payload::{Alert, PayloadBuilder};
use crate::events::{AlertCategory, Timestamp};
use chrono::{Duration, Utc};
use log::{error, info, warn};

/// What happened to one alert handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered and recorded in the ledger
    Delivered,
    /// Dropped because maintenance mode is on
    Suppressed,
    /// Dropped because no delivery channel is configured
    Unconfigured,
    /// Dropped because the category was delivered too recently
    OnCooldown { remaining: Duration },
    /// Delivery attempted but not confirmed; ledger untouched
    Failed,
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// Deduplicates, rate-limits and delivers alerts
///
/// Each category has its own cooldown, tracked in an [`AlertLedger`] that
/// only advances on confirmed delivery. A failed delivery therefore leaves
/// the category immediately eligible for the next qualifying entry.
pub struct AlertDispatcher {
    /// Delivery channel; `None` when no webhook is configured
    notifier: Option<Box<dyn Notifier>>,
    /// Last confirmed delivery per category
    ledger: AlertLedger,
    /// Renders alerts into webhook messages
    payload: PayloadBuilder,
    /// Global suppression switch
    maintenance_mode: bool,
}

impl AlertDispatcher {
    /// Create a dispatcher
    ///
    /// # Arguments
    ///
    /// * `notifier` - Delivery channel, or `None` to drop every alert
    /// * `cooldown` - Minimum time between deliveries of one category
    /// * `maintenance_mode` - Suppress all outbound notifications
    pub fn new(
        notifier: Option<Box<dyn Notifier>>,
        cooldown: Duration,
        maintenance_mode: bool,
    ) -> Self {
        Self {
            notifier,
            ledger: AlertLedger::new(cooldown),
            payload: PayloadBuilder::default(),
            maintenance_mode,
        }
    }

    /// Replace the payload presentation settings
    pub fn with_payload_builder(mut self, payload: PayloadBuilder) -> Self {
        self.payload = payload;
        self
    }

    /// Whether a delivery channel is configured
    pub fn is_configured(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn maintenance_mode(&self) -> bool {
        self.maintenance_mode
    }

    pub fn ledger(&self) -> &AlertLedger {
        &self.ledger
    }

    /// Dispatch an alert at the current time
    pub fn notify(&mut self, alert: &Alert) -> DispatchOutcome {
        self.notify_at(alert, Utc::now())
    }

    /// Dispatch an alert as if the current time were `now`
    ///
    /// Checks run in order: maintenance mode, missing channel, cooldown,
    /// then delivery. Only a confirmed delivery updates the ledger.
    pub fn notify_at(&mut self, alert: &Alert, now: Timestamp) -> DispatchOutcome {
        let category = alert.category;

        if self.maintenance_mode {
            info!(
                "[suppressed] Dropping {} alert (maintenance mode active)",
                category
            );
            return DispatchOutcome::Suppressed;
        }

        let Some(notifier) = self.notifier.as_ref() else {
            warn!(
                "[unconfigured] No webhook configured, skipping {} alert",
                category
            );
            return DispatchOutcome::Unconfigured;
        };

        if let Some(remaining) = self.ledger.remaining_at(category, now) {
            info!(
                "[cooldown] Skipping {} alert ({}s left of {}s)",
                category,
                remaining.num_seconds(),
                self.ledger.cooldown().num_seconds()
            );
            return DispatchOutcome::OnCooldown { remaining };
        }

        let message = self.payload.build(alert, now);
        match notifier.deliver(&message) {
            Ok(()) => {
                self.ledger.record_delivery_at(category, now);
                info!(
                    "[delivered] {} alert sent (severity: {})",
                    category,
                    category.severity()
                );
                DispatchOutcome::Delivered
            }
            Err(e) => {
                error!(
                    "[failed] Could not deliver {} alert (severity: {}): {}",
                    category,
                    category.severity(),
                    e
                );
                DispatchOutcome::Failed
            }
        }
    }

    /// Last confirmed delivery of a category
    pub fn last_delivered(&self, category: AlertCategory) -> Option<Timestamp> {
        self.ledger.last_delivered(category)
    }
}
