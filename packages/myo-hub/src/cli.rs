use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::hub::FanoutPolicy;

/// Myo Hub - live biosignal spike detection and viewer fan-out
#[derive(Parser, Debug)]
#[command(name = "myo-hub")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the hub and its websocket server (default)
    Serve(ServeArgs),

    /// Run the detector over a recording and score it against its labels
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// HTTP listen port
    #[arg(long, env = "MYO_HTTP_PORT", default_value_t = 4000)]
    pub http_port: u16,

    /// Bind address (0.0.0.0 for LAN access)
    #[arg(long, env = "MYO_BIND_ADDR", default_value = "127.0.0.1")]
    pub bind_addr: String,

    /// Device emitting one sample per line (live mode)
    #[arg(long, env = "MYO_DEVICE")]
    pub device: Option<PathBuf>,

    /// Generate a 1 Hz sine wave instead of reading a device
    #[arg(long, env = "MYO_SYNTHETIC")]
    pub synthetic: bool,

    /// Record every update to this file
    #[arg(long, env = "MYO_RECORD_FILE")]
    pub record_file: Option<PathBuf>,

    /// Replay updates from this file in a loop
    #[arg(long, env = "MYO_REPLAY_FILE")]
    pub replay_file: Option<PathBuf>,

    #[command(flatten)]
    pub detector: DetectorArgs,

    /// What to do with viewers that cannot keep up
    #[arg(long, value_enum, env = "MYO_FANOUT", default_value = "disconnect")]
    pub fanout: FanoutPolicy,

    /// Updates queued per viewer before a lagging viewer is disconnected
    /// (the block policy always uses a single slot)
    #[arg(long, env = "MYO_VIEWER_QUEUE", default_value_t = 1024)]
    pub viewer_queue: usize,

    /// Maximum simultaneous viewers
    #[arg(long, env = "MYO_MAX_VIEWERS", default_value_t = 64)]
    pub max_viewers: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DetectorArgs {
    /// Raw samples per smoothed mean/variance
    #[arg(long, default_value_t = 20)]
    pub instant_window: usize,

    /// Ticks of smoothed history kept
    #[arg(long, default_value_t = 300)]
    pub trailing_window: usize,

    /// Ticks between the two sides of a log-ratio
    #[arg(long, default_value_t = 100)]
    pub lookback: usize,

    /// Mean log-ratio counted as a spike or dip
    #[arg(long, default_value_t = 0.015)]
    pub spike_threshold: f64,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Recording to evaluate
    pub file: PathBuf,

    /// Maximum distance between a label and a matching prediction
    #[arg(short, long, default_value_t = 500)]
    pub tolerance_ms: i64,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub detector: DetectorArgs,
}
