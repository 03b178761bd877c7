use std::f64::consts::PI;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::ValueSource;
use crate::error::HubResult;
use crate::hub::Hub;
use crate::update::{now_millis, Update};

/// 1 Hz sine wave sampled on a fixed tick.
pub struct SyntheticSource {
    interval: Duration,
}

impl SyntheticSource {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

#[async_trait]
impl ValueSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn run(&self, hub: Hub) -> HubResult<()> {
        let start = Instant::now();
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let t = start.elapsed().as_secs_f64();
            let value = (2.0 * PI * t).sin() as f32;
            hub.broadcast(Update::sample_at(now_millis(), value)).await?;
        }
    }
}
