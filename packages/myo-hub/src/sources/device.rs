use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use super::ValueSource;
use crate::error::{HubError, HubResult};
use crate::hub::Hub;
use crate::update::Update;

/// Live acquisition from a character device (or any file) emitting one
/// numeric sample per line.
///
/// The port is expected to be configured already (baud rate etc.). A missing
/// or failing device is retried after `retry_delay`; a line that is not a
/// number is fatal.
pub struct DeviceSource {
    path: PathBuf,
    retry_delay: Duration,
}

impl DeviceSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Forward every sample from `reader` until it ends.
    async fn stream<R: AsyncRead + Unpin>(&self, reader: R, hub: &Hub) -> HubResult<()> {
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await.map_err(|source| HubError::Device {
            path: self.path.clone(),
            source,
        })? {
            let sample = line.trim();
            if sample.is_empty() {
                continue;
            }
            let value = sample
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| HubError::MalformedSample(sample.to_string()))?;
            hub.broadcast(Update::sample(value)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ValueSource for DeviceSource {
    fn name(&self) -> &'static str {
        "device"
    }

    async fn run(&self, hub: Hub) -> HubResult<()> {
        loop {
            match File::open(&self.path).await {
                Ok(file) => {
                    info!("Reading samples from {}", self.path.display());
                    match self.stream(file, &hub).await {
                        Ok(()) => info!("Device {} closed", self.path.display()),
                        Err(e @ HubError::Device { .. }) => warn!("{}", e),
                        Err(e) => return Err(e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Device {} not present", self.path.display());
                }
                Err(e) => warn!("Failed to open {}: {}", self.path.display(), e),
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubOptions;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_streams_numeric_lines() {
        let (hub, _coordinator) = Hub::spawn(HubOptions::default(), None).unwrap();
        let mut viewer = hub.subscribe().await.unwrap();
        let source = DeviceSource::new(PathBuf::from("test-device"));

        source
            .stream(&b"301\n\n-12.5\r\n"[..], &hub)
            .await
            .unwrap();

        for want in [301.0, -12.5] {
            let update: Update = serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
            assert_eq!(update.value, Some(want));
            assert!(update.time.is_some());
        }
    }

    #[tokio::test]
    async fn test_malformed_sample_is_fatal() {
        let (hub, _coordinator) = Hub::spawn(HubOptions::default(), None).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("tty");
        std::fs::write(&path, "12\nabc\n").unwrap();

        let err = DeviceSource::new(path).run(hub).await.unwrap_err();
        assert!(matches!(err, HubError::MalformedSample(s) if s == "abc"));
    }

    #[tokio::test]
    async fn test_non_finite_sample_is_fatal() {
        let (hub, _coordinator) = Hub::spawn(HubOptions::default(), None).unwrap();
        let mut viewer = hub.subscribe().await.unwrap();
        let source = DeviceSource::new(PathBuf::from("test-device"));

        for line in ["NaN", "inf", "-inf"] {
            let input = format!("300\n{}\n300\n", line);
            let err = source.stream(input.as_bytes(), &hub).await.unwrap_err();
            assert!(matches!(err, HubError::MalformedSample(ref s) if s == line));
        }

        // Only the readings before each bad line went out.
        for _ in 0..3 {
            let update: Update = serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
            assert_eq!(update.value, Some(300.0));
        }
        assert_eq!(hub.status().await.unwrap().samples_seen, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_missing_device() {
        let (hub, _coordinator) = Hub::spawn(HubOptions::default(), None).unwrap();
        let mut viewer = hub.subscribe().await.unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("tty");

        let source = DeviceSource::new(path.clone()).with_retry_delay(Duration::from_millis(100));
        let task = tokio::spawn(async move { source.run(hub).await });

        tokio::time::sleep(Duration::from_millis(250)).await;
        std::fs::write(&path, "7\n").unwrap();

        let update: Update = serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
        assert_eq!(update.value, Some(7.0));
        task.abort();
    }
}
