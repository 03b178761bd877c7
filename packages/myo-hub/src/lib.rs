pub mod cli;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod hub;
pub mod recorder;
pub mod registry;
pub mod server;
pub mod sources;
pub mod update;

pub use config::{ConfigError, HubConfig, SourceMode};
pub use error::{HubError, HubResult};
pub use hub::{FanoutPolicy, Hub, HubOptions, HubStatus, Viewer};
pub use recorder::{load_recording, Recorder, RecorderHandle};
pub use registry::{RegistrationResult, ViewerId, ViewerRegistry};
pub use sources::{open_source, DeviceSource, ReplaySource, SyntheticSource, ValueSource};
pub use update::{Update, UpdateRole};
