use crate::detector::{detect_spike, DetectorParams};
use crate::error::Result;
use crate::sliding_window::SlidingWindow;

/// Layered windows turning raw samples into spike predictions.
///
/// Raw samples are smoothed by the instant window; the smoothed means and
/// variances are kept in trailing histories; once a history is deeper than
/// the lookback, each new mean/variance is compared to its value one
/// lookback earlier as a log-ratio.
#[derive(Debug, Clone)]
pub struct StreamStats {
    params: DetectorParams,
    /// Rolling stats over raw samples.
    instant: SlidingWindow,
    /// Means from `instant`.
    means: SlidingWindow,
    /// Variances from `instant`.
    variances: SlidingWindow,
    /// Current-vs-lookback mean log-ratios.
    mean_log_ratios: SlidingWindow,
    /// Current-vs-lookback variance log-ratios.
    variance_log_ratios: SlidingWindow,
    samples_seen: u64,
}

impl StreamStats {
    pub fn new(params: DetectorParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::with_valid_params(params))
    }

    fn with_valid_params(params: DetectorParams) -> Self {
        Self {
            params,
            instant: SlidingWindow::with_stats(params.instant_window),
            means: SlidingWindow::new(params.trailing_window),
            variances: SlidingWindow::new(params.trailing_window),
            mean_log_ratios: SlidingWindow::new(params.trailing_window),
            variance_log_ratios: SlidingWindow::new(params.trailing_window),
            samples_seen: 0,
        }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// True once every window has filled. Never reverts.
    pub fn is_full(&self) -> bool {
        self.instant.is_full()
            && self.means.is_full()
            && self.variances.is_full()
            && self.mean_log_ratios.is_full()
            && self.variance_log_ratios.is_full()
    }

    pub fn push(&mut self, value: f64) {
        self.samples_seen += 1;

        self.instant.push(value);
        if !self.instant.is_full() {
            return;
        }

        let has_baseline = self.means.len() > self.params.lookback;
        let (mean, variance) = (self.instant.mean(), self.instant.variance());
        self.means.push(mean);
        self.variances.push(variance);
        if !has_baseline {
            return;
        }

        let lookback = -(self.params.lookback as isize);
        self.mean_log_ratios
            .push(mean.ln() - self.means.get(lookback).ln());
        self.variance_log_ratios
            .push(variance.ln() - self.variances.get(lookback).ln());

        if self.samples_seen == self.params.warmup_len() as u64 {
            log::debug!("stream statistics warm after {} samples", self.samples_seen);
        }
    }

    /// Whether a spike is currently recognized.
    ///
    /// # Panics
    ///
    /// If called before [`is_full`](Self::is_full).
    pub fn pred(&self) -> bool {
        assert!(
            self.is_full(),
            "prediction requested after {} of {} warm-up samples",
            self.samples_seen,
            self.params.warmup_len()
        );
        detect_spike(
            &self.mean_log_ratios,
            self.params.spike_threshold,
            self.params.lookback,
        )
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn smoothed_mean(&self) -> Option<f64> {
        self.instant.is_full().then(|| self.instant.mean())
    }

    pub fn smoothed_variance(&self) -> Option<f64> {
        self.instant.is_full().then(|| self.instant.variance())
    }

    pub fn mean_log_ratio(&self) -> Option<f64> {
        (!self.mean_log_ratios.is_empty()).then(|| self.mean_log_ratios.get(0))
    }

    pub fn variance_log_ratio(&self) -> Option<f64> {
        (!self.variance_log_ratios.is_empty()).then(|| self.variance_log_ratios.get(0))
    }

    pub fn mean_log_ratios(&self) -> &SlidingWindow {
        &self.mean_log_ratios
    }

    pub fn variance_log_ratios(&self) -> &SlidingWindow {
        &self.variance_log_ratios
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::with_valid_params(DetectorParams::default())
    }
}
