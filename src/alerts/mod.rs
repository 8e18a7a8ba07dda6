/// Alert dispatching, cooldown tracking and webhook delivery
pub mod cooldown;
pub mod dispatcher;
pub mod notifier;
pub mod payload;

pub use cooldown::AlertLedger;
pub use dispatcher::{AlertDispatcher, DispatchOutcome};
pub use notifier::{Notifier, WebhookNotifier};
pub use payload::{Alert, PayloadBuilder, WebhookMessage};
