//! Producers of raw readings for the hub.
//!
//! Exactly one source runs per process; which one is decided at startup by
//! [`SourceMode`](crate::config::SourceMode).

mod device;
mod replay;
mod synthetic;

pub use device::DeviceSource;
pub use replay::ReplaySource;
pub use synthetic::SyntheticSource;

use async_trait::async_trait;

use crate::config::SourceMode;
use crate::error::HubResult;
use crate::hub::Hub;

/// An unbounded stream of readings fed into the hub.
#[async_trait]
pub trait ValueSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Produce readings until a fatal error occurs. Returning ends the
    /// process.
    async fn run(&self, hub: Hub) -> HubResult<()>;
}

/// Build the source for a run mode. Replay files are loaded here, before
/// any task starts.
pub async fn open_source(mode: &SourceMode) -> HubResult<Box<dyn ValueSource>> {
    Ok(match mode {
        SourceMode::Device(path) => Box::new(DeviceSource::new(path.clone())),
        SourceMode::Synthetic => Box::new(SyntheticSource::default()),
        SourceMode::Replay(path) => Box::new(ReplaySource::from_file(path).await?),
    })
}
