//! Rolling outcome window used for error-rate estimation

pub mod outcome_window;

pub use outcome_window::{OutcomeWindow, DEFAULT_WINDOW_SIZE};
