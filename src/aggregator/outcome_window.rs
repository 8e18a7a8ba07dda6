//! Fixed-capacity window of recent request outcomes
//!
//! This module provides the OutcomeWindow used to estimate the rolling
//! error rate over the last N requests.

use std::collections::VecDeque;

/// Default number of requests in the window
pub const DEFAULT_WINDOW_SIZE: usize = 200;

/// Ring buffer of per-request outcomes (`true` = server error)
///
/// Appends at the tail and evicts at the head once capacity is reached, so
/// the window always holds the most recent `capacity` outcomes.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    /// Recorded outcomes, oldest first
    outcomes: VecDeque<bool>,
    /// Maximum number of outcomes retained
    capacity: usize,
    /// Number of `true` values currently held
    errors: usize,
}

impl OutcomeWindow {
    /// Create an empty window holding at most `capacity` outcomes
    ///
    /// A capacity of 0 is treated as 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use poolwatch::aggregator::OutcomeWindow;
    ///
    /// let mut window = OutcomeWindow::new(4);
    /// window.push(true);
    /// window.push(false);
    /// assert_eq!(window.rate(), 50.0);
    /// assert!(!window.is_full());
    /// ```
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            errors: 0,
        }
    }

    /// Record one outcome, evicting the oldest if the window is full
    pub fn push(&mut self, is_error: bool) {
        if self.outcomes.len() == self.capacity {
            if let Some(true) = self.outcomes.pop_front() {
                self.errors -= 1;
            }
        }
        self.outcomes.push_back(is_error);
        if is_error {
            self.errors += 1;
        }
    }

    /// Error rate over the current contents as a percentage (0-100)
    ///
    /// Returns 0.0 for an empty window. Callers must not alert on the rate
    /// until [`is_full`](Self::is_full) holds.
    pub fn rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        (self.errors as f64 / self.outcomes.len() as f64) * 100.0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether the window holds `capacity` outcomes
    pub fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of errors currently in the window
    pub fn error_count(&self) -> usize {
        self.errors
    }
}

impl Default for OutcomeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    // After M >= N pushes the window holds exactly the last N outcomes
    #[quickcheck]
    fn prop_rate_reflects_last_n_pushes(outcomes: Vec<bool>, capacity: u8) -> TestResult {
        let capacity = capacity as usize;
        if capacity == 0 || outcomes.len() < capacity {
            return TestResult::discard();
        }

        let mut window = OutcomeWindow::new(capacity);
        for &outcome in &outcomes {
            window.push(outcome);
        }

        let tail = &outcomes[outcomes.len() - capacity..];
        let expected_errors = tail.iter().filter(|&&e| e).count();
        let expected_rate = (expected_errors as f64 / capacity as f64) * 100.0;

        TestResult::from_bool(
            window.len() == capacity
                && window.error_count() == expected_errors
                && (window.rate() - expected_rate).abs() < 1e-9,
        )
    }

    #[quickcheck]
    fn prop_length_never_exceeds_capacity(outcomes: Vec<bool>, capacity: u8) -> bool {
        let mut window = OutcomeWindow::new(capacity as usize);
        outcomes.iter().all(|&outcome| {
            window.push(outcome);
            window.len() <= window.capacity()
        })
    }

    #[quickcheck]
    fn prop_rate_is_idempotent(outcomes: Vec<bool>) -> bool {
        let mut window = OutcomeWindow::new(16);
        for outcome in outcomes {
            window.push(outcome);
        }
        let first = window.rate();
        (0..5).all(|_| window.rate() == first)
    }
}
