use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use super::ValueSource;
use crate::error::{HubError, HubResult};
use crate::hub::Hub;
use crate::recorder::load_recording;
use crate::update::{now_millis, Update};

/// Replays a recording in a loop, reproducing the original spacing.
pub struct ReplaySource {
    records: Vec<Update>,
    /// Emit this much ahead of schedule to cover viewer rendering latency.
    lookahead: Duration,
    /// Pause between the last record and the reset marker.
    settle: Duration,
}

impl ReplaySource {
    pub fn new(records: Vec<Update>) -> HubResult<Self> {
        if let Some(line) = records.iter().position(|r| r.time.is_none()) {
            return Err(HubError::MissingTimestamp { line: line + 1 });
        }
        if records.is_empty() {
            return Err(HubError::EmptyRecording {
                path: "<memory>".into(),
            });
        }
        Ok(Self {
            records,
            lookahead: Duration::from_millis(5),
            settle: Duration::from_secs(1),
        })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let source = Self::new(load_recording(path).await?)?;
        info!(
            "Loaded {} records from {} for replay",
            source.records.len(),
            path.display()
        );
        Ok(source)
    }

    pub fn with_timing(mut self, lookahead: Duration, settle: Duration) -> Self {
        self.lookahead = lookahead;
        self.settle = settle;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ValueSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    async fn run(&self, hub: Hub) -> HubResult<()> {
        let first = self.records[0].time.unwrap_or_default();

        let mut pass = 0u64;
        loop {
            pass += 1;
            debug!("Starting replay pass {}", pass);
            let start = Instant::now();
            let wall_start = now_millis();

            for record in &self.records {
                // Reset markers of the original stream carry no reading.
                if record.reset {
                    continue;
                }
                let offset_ms = (record.time.unwrap_or(first) - first).max(0);
                let offset = Duration::from_millis(offset_ms as u64);
                time::sleep_until(start + offset.saturating_sub(self.lookahead)).await;

                hub.broadcast(Update {
                    time: Some(wall_start + offset_ms),
                    value: record.value,
                    label: record.label,
                    ..Update::default()
                })
                .await?;
            }

            time::sleep(self.settle).await;
            hub.reset().await?;
        }
    }
}
