//! Online statistics over a scalar biosignal stream.
//!
//! [`SlidingWindow`] keeps a ring of recent samples with O(1) rolling
//! mean/variance. [`StreamStats`] stacks several windows at different time
//! scales and flags spikes that follow a recent dip. [`metrics`] scores
//! flagged timestamps against manual labels.

pub mod detector;
pub mod error;
pub mod metrics;
pub mod sliding_window;
pub mod stream_stats;

pub use detector::{detect_spike, DetectorParams};
pub use error::{Result, StatsError};
pub use metrics::{match_events, EventCounts};
pub use sliding_window::SlidingWindow;
pub use stream_stats::StreamStats;
