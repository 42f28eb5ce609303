//! Shared numeric helpers.

pub mod stats;

pub use stats::{improvement_percent, jain_fairness, mean, std_dev};
