//! Size-normalized duration estimates for the slow signer operations.
//!
//! Each operation kind keeps a newest-first window of at most
//! [`WINDOW_CAPACITY`] samples in seconds per kilobyte. Estimates scale the
//! window mean by the input size; an empty window falls back to a pessimistic
//! constant divided by half the available parallelism.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::config::SharedSettings;

/// Samples kept per kind.
pub const WINDOW_CAPACITY: usize = 5;
/// Bytes in one size unit (samples are seconds per kilobyte).
pub const SIZE_UNIT_BYTES: f64 = 1000.0;
/// Seconds in one time unit.
pub const TIME_UNIT_SECS: f64 = 1.0;

const DESERIALIZE_FALLBACK_RATE: f64 = 10.0;
const SIGN_FALLBACK_RATE: f64 = 20.0;

/// Operation kinds that are timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingKind {
    Sign,
    Deserialize,
}

impl TimingKind {
    pub const ALL: [Self; 2] = [Self::Deserialize, Self::Sign];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Deserialize => "deserialize",
        }
    }

    const fn fallback_base(self) -> f64 {
        match self {
            Self::Sign => SIGN_FALLBACK_RATE,
            Self::Deserialize => DESERIALIZE_FALLBACK_RATE,
        }
    }
}

impl fmt::Display for TimingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rolling timing windows persisted through the settings store.
#[derive(Clone)]
pub struct TimingEstimator {
    store: SharedSettings,
    parallelism: usize,
}

impl fmt::Debug for TimingEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingEstimator")
            .field("parallelism", &self.parallelism)
            .finish_non_exhaustive()
    }
}

impl TimingEstimator {
    #[must_use]
    pub fn new(store: SharedSettings) -> Self {
        let parallelism = std::thread::available_parallelism().map_or(2, std::num::NonZero::get);
        Self { store, parallelism }
    }

    /// Override the detected hardware parallelism (min 1).
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Record one measurement. Returns the stored rate, or `None` for empty inputs.
    pub fn record(&self, kind: TimingKind, measured: Duration, input_bytes: u64) -> Option<f64> {
        if input_bytes == 0 {
            log::debug!("skipping {kind} timing sample for empty input");
            return None;
        }
        let rate = (measured.as_secs_f64() / TIME_UNIT_SECS) / size_units(input_bytes);
        let mut store = self.store.lock();
        let mut window = store.timing_window(kind);
        push_sample(&mut window, rate);
        store.set_timing_window(kind, window);
        log::debug!(
            "recorded {kind} sample {rate:.4}s/KB ({:.3}s for {input_bytes} bytes)",
            measured.as_secs_f64()
        );
        Some(rate)
    }

    /// Current samples for `kind`, newest first.
    #[must_use]
    pub fn window(&self, kind: TimingKind) -> Vec<f64> {
        self.store.lock().timing_window(kind)
    }

    /// Mean of the window rounded to two decimals, if any samples exist.
    #[must_use]
    pub fn average(&self, kind: TimingKind) -> Option<f64> {
        mean_rounded(&self.window(kind))
    }

    /// Pessimistic rate used before any sample exists.
    #[must_use]
    pub fn fallback_rate(&self, kind: TimingKind) -> f64 {
        kind.fallback_base() / (self.parallelism as f64 / 2.0)
    }

    /// Average rate, or the fallback when there is no data. An average that
    /// rounds to zero counts as no data.
    #[must_use]
    pub fn rate(&self, kind: TimingKind) -> f64 {
        self.average(kind)
            .filter(|avg| *avg > 0.0)
            .unwrap_or_else(|| self.fallback_rate(kind))
    }

    /// Expected duration of `kind` for an input of `input_bytes`.
    #[must_use]
    pub fn estimate_duration(&self, kind: TimingKind, input_bytes: u64) -> Duration {
        let secs = self.rate(kind) * size_units(input_bytes) * TIME_UNIT_SECS;
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

fn size_units(bytes: u64) -> f64 {
    bytes as f64 / SIZE_UNIT_BYTES
}

/// Insert `sample` as newest and evict the oldest beyond capacity.
fn push_sample(window: &mut Vec<f64>, sample: f64) {
    window.insert(0, sample);
    window.truncate(WINDOW_CAPACITY);
}

fn mean_rounded(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, ConfigStore};

    fn estimator() -> TimingEstimator {
        let store = ConfigStore::in_memory(Config::default()).into_shared();
        TimingEstimator::new(store).with_parallelism(4)
    }

    #[test]
    fn window_keeps_five_newest_first() {
        let est = estimator();
        for secs in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            est.record(TimingKind::Sign, Duration::from_secs_f64(secs), 1000);
        }
        assert_eq!(est.window(TimingKind::Sign), vec![6.0, 5.0, 4.0, 3.0, 2.0]);
        assert!(est.window(TimingKind::Deserialize).is_empty());
    }

    #[test]
    fn rate_is_seconds_per_kilobyte() {
        let est = estimator();
        let rate = est
            .record(TimingKind::Deserialize, Duration::from_secs(2), 4000)
            .unwrap();
        assert!((rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_not_recorded() {
        let est = estimator();
        assert!(
            est.record(TimingKind::Sign, Duration::from_secs(1), 0)
                .is_none()
        );
        assert!(est.window(TimingKind::Sign).is_empty());
    }

    #[test]
    fn fallback_scales_with_parallelism() {
        let est = estimator();
        assert!((est.fallback_rate(TimingKind::Deserialize) - 5.0).abs() < 1e-12);
        assert!((est.fallback_rate(TimingKind::Sign) - 10.0).abs() < 1e-12);
        let single = estimator().with_parallelism(1);
        assert!((single.fallback_rate(TimingKind::Sign) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn estimate_without_samples_uses_fallback() {
        let est = estimator();
        assert_eq!(est.average(TimingKind::Deserialize), None);
        let expected = est.fallback_rate(TimingKind::Deserialize) * 3.0;
        let got = est.estimate_duration(TimingKind::Deserialize, 3000);
        assert!((got.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn estimate_with_one_sample_is_rate_times_size() {
        let est = estimator();
        est.record(TimingKind::Deserialize, Duration::from_millis(100), 1000);
        let got = est.estimate_duration(TimingKind::Deserialize, 10_000);
        assert!((got.as_secs_f64() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn average_rounding_to_zero_uses_fallback() {
        let est = estimator();
        est.record(TimingKind::Deserialize, Duration::from_millis(4), 1000);
        assert_eq!(est.average(TimingKind::Deserialize), Some(0.0));
        assert!((est.rate(TimingKind::Deserialize) - 5.0).abs() < 1e-12);
        let got = est.estimate_duration(TimingKind::Deserialize, 10_000);
        assert!((got.as_secs_f64() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        assert_eq!(mean_rounded(&[0.111, 0.222]), Some(0.17));
        assert_eq!(mean_rounded(&[]), None);
    }

    #[test]
    fn samples_reach_the_settings_store() {
        let store = ConfigStore::in_memory(Config::default()).into_shared();
        let est = TimingEstimator::new(store.clone());
        est.record(TimingKind::Sign, Duration::from_secs(3), 1500);
        let guard = store.lock();
        assert_eq!(guard.config().stats.sign, vec![2.0]);
        assert!(guard.is_dirty());
    }
}
