//! Fixed-capacity ring buffer of samples with optional rolling statistics.
//!
//! While the window is filling, mean and variance are accumulated with
//! Welford's method. Once it is full, each push replaces the oldest sample
//! and the statistics are adjusted with the add-new/remove-oldest update, so
//! the buffer is never rescanned.

/// Sliding window over the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    values: Vec<f64>,
    /// Slot holding the most recent sample.
    cursor: usize,
    len: usize,
    track_stats: bool,
    mean: f64,
    /// Sum of squared deviations while filling, variance once full.
    variance: f64,
}

impl SlidingWindow {
    /// Window that only retains raw history for [`get`](Self::get).
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, false)
    }

    /// Window that also maintains a running mean and variance.
    ///
    /// # Panics
    ///
    /// If `capacity < 2`: the variance is normalized by `capacity - 1`.
    pub fn with_stats(capacity: usize) -> Self {
        assert!(
            capacity >= 2,
            "a window tracking variance needs at least 2 slots, got {capacity}"
        );
        Self::build(capacity, true)
    }

    fn build(capacity: usize, track_stats: bool) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            values: vec![0.0; capacity],
            cursor: 0,
            len: 0,
            track_stats,
            mean: 0.0,
            variance: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.values.len()
    }

    pub fn tracks_stats(&self) -> bool {
        self.track_stats
    }

    /// Sample pushed `|i|` steps before the most recent one; `get(0)` is
    /// the newest sample.
    ///
    /// # Panics
    ///
    /// If `i` is outside `(-len, 0]`.
    pub fn get(&self, i: isize) -> f64 {
        assert!(
            i <= 0 && i > -(self.len as isize),
            "index {i} outside (-{}, 0]",
            self.len
        );
        let capacity = self.values.len() as isize;
        self.values[(self.cursor as isize + i).rem_euclid(capacity) as usize]
    }

    /// Retained samples, oldest first.
    pub fn values(&self) -> Vec<f64> {
        (1 - self.len as isize..=0).map(|i| self.get(i)).collect()
    }

    /// Running mean. Always `0.0` when statistics are not tracked.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Running variance, normalized by `n - 1`.
    ///
    /// Before the window first fills this is computed from the samples seen
    /// so far; with fewer than two samples it is `0.0`.
    pub fn variance(&self) -> f64 {
        if self.is_full() {
            self.variance
        } else if self.len >= 2 {
            self.variance / (self.len - 1) as f64
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().max(0.0).sqrt()
    }

    /// Push a sample, evicting the oldest one once the window is full.
    pub fn push(&mut self, value: f64) {
        self.cursor = (self.cursor + 1) % self.values.len();

        if self.track_stats {
            let old_mean = self.mean;
            if self.is_full() {
                // The slot under the cursor holds the sample being evicted.
                let oldest = self.values[self.cursor];
                let n = self.len as f64;
                self.mean += (value - oldest) / n;
                self.variance +=
                    (value - oldest) * (value - self.mean + oldest - old_mean) / (n - 1.0);
            } else {
                self.len += 1;
                self.mean += (value - self.mean) / self.len as f64;
                self.variance += (value - self.mean) * (value - old_mean);
                if self.is_full() {
                    self.variance /= (self.len - 1) as f64;
                }
            }
        } else if !self.is_full() {
            self.len += 1;
        }

        self.values[self.cursor] = value;
    }
}
