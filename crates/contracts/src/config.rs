//! BridgeConfig - Config Loader output
//!
//! Describes the whole bridge: SDK/driver settings, output transport and the
//! sensors simulated by the mock SDK. Loaded once at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{FrameMode, SdkOptions, SerialNumber};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    pub driver: DriverConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    /// Sensors emitted by the mock SDK
    #[serde(default)]
    pub simulated_sensors: Vec<SimulatedSensorConfig>,
}

/// Driver and SDK settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Capture file to replay (None = live sensors)
    #[serde(default)]
    pub capture_path: Option<PathBuf>,

    /// Loop the capture when it reaches the end
    #[serde(default = "default_true")]
    pub capture_loop: bool,

    /// Publish every sensor on one shared set of channels
    #[serde(default)]
    pub combine_sensors: bool,

    /// Vendor control-flags bitmask
    #[serde(default)]
    pub control_flags: u32,

    /// Prefix for every topic and frame id
    #[serde(default = "default_output_namespace")]
    pub output_namespace: String,

    #[serde(default)]
    pub frame_mode: FrameMode,
}

impl DriverConfig {
    /// Options forwarded to the SDK
    pub fn sdk_options(&self) -> SdkOptions {
        SdkOptions {
            control_flags: self.control_flags,
            frame_mode: self.frame_mode,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            capture_path: None,
            capture_loop: true,
            combine_sensors: false,
            control_flags: 0,
            output_namespace: default_output_namespace(),
            frame_mode: FrameMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_output_namespace() -> String {
    "cepton".to_string()
}

/// Output transport selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub transport_type: TransportType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Transport types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Log a summary of every message
    #[default]
    Log,
    /// Append messages to one file per topic
    File,
    /// Keep messages in memory
    Memory,
}

/// One sensor simulated by the mock SDK
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedSensorConfig {
    pub serial_number: SerialNumber,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default)]
    pub model: u16,

    #[serde(default)]
    pub firmware_version: u16,

    /// Batch rate (Hz)
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    #[serde(default = "default_points_per_batch")]
    pub points_per_batch: usize,

    /// Fraction of points generated without a return
    #[serde(default)]
    pub zero_distance_ratio: f64,
}

fn default_model_name() -> String {
    "SIMULATED".to_string()
}

fn default_frequency_hz() -> f64 {
    10.0
}

fn default_points_per_batch() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.output_namespace, "cepton");
        assert!(config.capture_loop);
        assert!(!config.combine_sensors);
        assert_eq!(config.sdk_options().frame_mode, FrameMode::Cover);
    }

    #[test]
    fn test_serde_defaults_from_empty_object() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, ConfigVersion::V1);
        assert_eq!(config.transport.transport_type, TransportType::Log);
        assert!(config.simulated_sensors.is_empty());
        assert_eq!(config.driver.output_namespace, "cepton");
    }

    #[test]
    fn test_simulated_sensor_defaults() {
        let sensor: SimulatedSensorConfig =
            serde_json::from_str(r#"{ "serial_number": 1001 }"#).unwrap();
        assert_eq!(sensor.serial_number, SerialNumber(1001));
        assert_eq!(sensor.points_per_batch, 1000);
        assert!((sensor.frequency_hz - 10.0).abs() < f64::EPSILON);
    }
}
