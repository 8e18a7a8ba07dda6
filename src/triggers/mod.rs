/// Server-error classification of single requests
pub mod classifier;

/// Failover and recovery edge detection
pub mod pool_tracker;

pub use classifier::{is_error_entry, is_server_error};
pub use pool_tracker::{Failover, PoolTracker, PoolTransition, Recovery};
