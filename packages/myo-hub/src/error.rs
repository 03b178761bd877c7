use std::path::PathBuf;

use thiserror::Error;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors raised by the hub and its collaborators
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Hub coordinator has stopped")]
    HubClosed,

    #[error("Recorder has stopped")]
    RecorderClosed,

    #[error("Viewer limit of {0} reached")]
    AtCapacity(usize),

    #[error("Failed to write recording {}: {source}", path.display())]
    Recording {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read recording {}: {source}", path.display())]
    ReadRecording {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed record on line {line} of {}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Record on line {line} has no timestamp")]
    MissingTimestamp { line: usize },

    #[error("Recording {} contains no records", path.display())]
    EmptyRecording { path: PathBuf },

    #[error("Device {} unavailable: {source}", path.display())]
    Device {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed sample from device: {0:?}")]
    MalformedSample(String),

    #[error("Invalid detector parameters: {0}")]
    Detector(#[from] myo_stats::StatsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
