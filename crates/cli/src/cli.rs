//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Lidar Bridge - publishes lidar SDK point batches as point-cloud messages
#[derive(Parser, Debug)]
#[command(
    name = "lidar-bridge",
    author,
    version,
    about = "Lidar sensor SDK to pub/sub bridge",
    long_about = "Registers with the sensor SDK, converts every point batch it delivers \n\
                  to image-space and Cartesian point clouds, and publishes them together \n\
                  with sensor metadata on the configured transport."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LIDAR_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LIDAR_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default filter directive when RUST_LOG is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and the topics it produces
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "bridge.toml",
        env = "LIDAR_BRIDGE_CONFIG"
    )]
    pub config: PathBuf,

    /// Replay a capture file instead of listening to live sensors
    #[arg(long, env = "LIDAR_BRIDGE_CAPTURE_PATH")]
    pub capture_path: Option<PathBuf>,

    /// Play the capture once instead of looping
    #[arg(long)]
    pub no_loop: bool,

    /// Publish all sensors on one shared set of topics
    #[arg(long, env = "LIDAR_BRIDGE_COMBINE_SENSORS")]
    pub combine_sensors: bool,

    /// Override the topic / frame-id namespace
    #[arg(long, env = "LIDAR_BRIDGE_NAMESPACE")]
    pub namespace: Option<String>,

    /// Override the SDK control-flags bitmask
    #[arg(long, env = "LIDAR_BRIDGE_CONTROL_FLAGS")]
    pub control_flags: Option<u32>,

    /// Override the output transport
    #[arg(long, value_enum, env = "LIDAR_BRIDGE_TRANSPORT")]
    pub transport: Option<TransportArg>,

    /// Output directory for the file transport
    #[arg(long, env = "LIDAR_BRIDGE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many handled batches (0 = unlimited)
    #[arg(long, default_value = "0", env = "LIDAR_BRIDGE_MAX_BATCHES")]
    pub max_batches: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "LIDAR_BRIDGE_TIMEOUT")]
    pub timeout: u64,

    /// Seconds between progress log lines (0 = disabled)
    #[arg(long, default_value = "5", env = "LIDAR_BRIDGE_STATS_INTERVAL")]
    pub stats_interval: u64,

    /// Validate configuration and exit without starting the driver
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "LIDAR_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show simulated sensor details
    #[arg(long)]
    pub sensors: bool,

    /// Show the topics each sensor publishes on
    #[arg(long)]
    pub topics: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Transport override
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportArg {
    Log,
    File,
    Memory,
}

impl From<TransportArg> for contracts::TransportType {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Log => contracts::TransportType::Log,
            TransportArg::File => contracts::TransportType::File,
            TransportArg::Memory => contracts::TransportType::Memory,
        }
    }
}
