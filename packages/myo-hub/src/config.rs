use std::path::PathBuf;

use myo_stats::{DetectorParams, StatsError};

use crate::cli::{DetectorArgs, ServeArgs};
use crate::hub::{FanoutPolicy, HubOptions};

/// Where readings come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMode {
    Device(PathBuf),
    Synthetic,
    Replay(PathBuf),
}

/// Immutable process configuration, validated once at startup
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub http_port: u16,
    pub bind_addr: String,
    pub source: SourceMode,
    /// Recording target; never set in replay mode
    pub record_file: Option<PathBuf>,
    pub detector: DetectorParams,
    pub fanout: FanoutPolicy,
    pub viewer_queue: usize,
    pub max_viewers: usize,
}

impl HubConfig {
    pub fn from_args(args: &ServeArgs) -> Result<Self, ConfigError> {
        let source = match (&args.replay_file, args.synthetic, &args.device) {
            (Some(_), _, _) if args.record_file.is_some() => {
                return Err(ConfigError::ConflictingModes(
                    "--replay-file cannot be combined with --record-file".to_string(),
                ))
            }
            (Some(_), true, _) => {
                return Err(ConfigError::ConflictingModes(
                    "--replay-file cannot be combined with --synthetic".to_string(),
                ))
            }
            (Some(_), false, Some(_)) => {
                return Err(ConfigError::ConflictingModes(
                    "--replay-file cannot be combined with --device".to_string(),
                ))
            }
            (None, true, Some(_)) => {
                return Err(ConfigError::ConflictingModes(
                    "--synthetic cannot be combined with --device".to_string(),
                ))
            }
            (Some(path), false, None) => SourceMode::Replay(path.clone()),
            (None, true, None) => SourceMode::Synthetic,
            (None, false, Some(path)) => SourceMode::Device(path.clone()),
            (None, false, None) => return Err(ConfigError::MissingDevice),
        };

        if args.viewer_queue == 0 {
            return Err(ConfigError::InvalidValue(
                "viewer queue must hold at least one update".to_string(),
            ));
        }
        if args.max_viewers == 0 {
            return Err(ConfigError::InvalidValue(
                "at least one viewer must be allowed".to_string(),
            ));
        }

        Ok(Self {
            http_port: args.http_port,
            bind_addr: args.bind_addr.clone(),
            source,
            record_file: args.record_file.clone(),
            detector: detector_params(&args.detector)?,
            fanout: args.fanout,
            viewer_queue: args.viewer_queue,
            max_viewers: args.max_viewers,
        })
    }

    /// Get the full bind address (addr:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }

    pub fn hub_options(&self) -> HubOptions {
        HubOptions {
            detector: self.detector,
            fanout: self.fanout,
            viewer_queue: self.viewer_queue,
            max_viewers: self.max_viewers,
            ..HubOptions::default()
        }
    }
}

/// Validated detector constants from the command line
pub fn detector_params(args: &DetectorArgs) -> Result<DetectorParams, ConfigError> {
    let params = DetectorParams {
        instant_window: args.instant_window,
        trailing_window: args.trailing_window,
        lookback: args.lookback,
        spike_threshold: args.spike_threshold,
    };
    params.validate()?;
    Ok(params)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Conflicting run modes: {0}")]
    ConflictingModes(String),
    #[error("No source configured: pass --device, --synthetic or --replay-file")]
    MissingDevice,
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Detector(#[from] StatsError),
}
