use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::sliding_window::SlidingWindow;

/// Time-scale constants and threshold for [`StreamStats`](crate::StreamStats).
///
/// Defaults are tuned for a ~100 Hz signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Raw samples smoothed into each per-tick mean/variance (~200 ms).
    pub instant_window: usize,
    /// History of smoothed means, variances and their log-ratios (~3 s).
    pub trailing_window: usize,
    /// Distance, in ticks, between the two values of a log-ratio (~1 s).
    pub lookback: usize,
    /// Minimum absolute mean log-ratio counted as a spike or a dip.
    pub spike_threshold: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            instant_window: 20,
            trailing_window: 300,
            lookback: 100,
            spike_threshold: 0.015,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<()> {
        if self.instant_window < 2 {
            return Err(StatsError::InvalidParameter(format!(
                "instant window must hold at least 2 samples, got {}",
                self.instant_window
            )));
        }
        if self.lookback == 0 {
            return Err(StatsError::InvalidParameter(
                "lookback must be positive".to_string(),
            ));
        }
        // The detector scans two lookback periods of log-ratios.
        if self.trailing_window <= 2 * self.lookback {
            return Err(StatsError::InvalidParameter(format!(
                "trailing window ({}) must exceed twice the lookback ({})",
                self.trailing_window, self.lookback
            )));
        }
        if !self.spike_threshold.is_finite() || self.spike_threshold <= 0.0 {
            return Err(StatsError::InvalidParameter(format!(
                "spike threshold must be a positive number, got {}",
                self.spike_threshold
            )));
        }
        Ok(())
    }

    /// Raw pushes needed, from empty, before a prediction is possible.
    pub fn warmup_len(&self) -> usize {
        self.instant_window + self.lookback + self.trailing_window
    }
}

/// Spike-then-dip rule over a window of mean log-ratios (index 0 is now).
///
/// Fires when the current ratio is at least `threshold`, some ratio in the
/// last `lookback` ticks is at most `-threshold`, and no ratio between that
/// dip and `2 * lookback` ticks ago exceeds `threshold`. A rise with no
/// preceding dip, or a dip that merely recovers from an earlier spike, does
/// not count.
///
/// # Panics
///
/// If `ratios` holds `2 * lookback` samples or fewer.
pub fn detect_spike(ratios: &SlidingWindow, threshold: f64, lookback: usize) -> bool {
    let lookback = lookback as isize;
    assert!(
        ratios.len() as isize > 2 * lookback,
        "spike detection needs more than {} log-ratios, have {}",
        2 * lookback,
        ratios.len()
    );

    let current = ratios.get(0);
    if current.is_nan() || current < threshold {
        return false;
    }

    let Some(dip) = (-lookback..=0).rev().find(|&i| ratios.get(i) <= -threshold) else {
        return false;
    };

    !(-2 * lookback..=dip).any(|i| ratios.get(i) > threshold)
}
