//! Pool transition detection
//!
//! Tracks which pool is serving traffic and raises failover and recovery
//! edges as the observed pool changes.

use crate::events::PLACEHOLDER;

/// Traffic moved from one pool to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failover {
    pub previous: String,
    pub current: String,
}

/// Traffic returned to the configured active pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub pool: String,
}

/// Edges raised by a single observation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolTransition {
    pub failover: Option<Failover>,
    pub recovery: Option<Recovery>,
}

impl PoolTransition {
    /// Whether neither edge fired
    pub fn is_quiet(&self) -> bool {
        self.failover.is_none() && self.recovery.is_none()
    }
}

/// Two-value state machine over (configured active pool, last observed pool)
#[derive(Debug, Clone)]
pub struct PoolTracker {
    /// Pool expected to serve traffic; fixed for the process lifetime
    active_pool: String,
    /// Most recent valid pool value seen
    last_pool: String,
}

impl PoolTracker {
    /// Start tracking, assuming traffic is on the active pool
    pub fn new(active_pool: impl Into<String>) -> Self {
        let active_pool = active_pool.into();
        Self {
            last_pool: active_pool.clone(),
            active_pool,
        }
    }

    pub fn active_pool(&self) -> &str {
        &self.active_pool
    }

    pub fn last_pool(&self) -> &str {
        &self.last_pool
    }

    /// Feed the pool value of one entry
    ///
    /// Absent, empty and placeholder values are ignored. Recovery is judged
    /// against the pool observed *before* this entry; the failover edge then
    /// updates the last observed pool. Both edges can fire on one entry.
    pub fn observe(&mut self, pool: Option<&str>) -> PoolTransition {
        let pool = match pool {
            Some(pool) if !pool.is_empty() && pool != PLACEHOLDER => pool,
            _ => return PoolTransition::default(),
        };

        let recovery = (pool == self.active_pool && self.last_pool != self.active_pool).then(|| {
            Recovery {
                pool: self.active_pool.clone(),
            }
        });

        let failover = if pool != self.last_pool {
            let previous = std::mem::replace(&mut self.last_pool, pool.to_string());
            Some(Failover {
                previous,
                current: pool.to_string(),
            })
        } else {
            None
        };

        PoolTransition { failover, recovery }
    }
}
