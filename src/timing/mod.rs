//! Throughput history and duration estimates for slow external operations.

pub mod estimator;

pub use estimator::{TimingEstimator, TimingKind};
