//! Config validation
//!
//! Rules:
//! - output_namespace non-empty, topic-safe characters only
//! - simulated serial numbers unique
//! - frequency_hz finite and > 0 with a representable period, points_per_batch > 0
//! - 0 <= zero_distance_ratio <= 1
//! - file transport format is json or bincode

use std::collections::HashSet;
use std::time::Duration;

use contracts::{BridgeConfig, ContractError, TransportType};

/// Validate a BridgeConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_namespace(config)?;
    validate_serial_numbers(config)?;
    validate_simulated_sensors(config)?;
    validate_transport(config)?;
    Ok(())
}

/// Namespace ends up in every topic name
fn validate_namespace(config: &BridgeConfig) -> Result<(), ContractError> {
    let ns = &config.driver.output_namespace;
    if ns.is_empty() {
        return Err(ContractError::config_validation(
            "driver.output_namespace",
            "output_namespace cannot be empty",
        ));
    }
    if let Some(c) = ns
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '/'))
    {
        return Err(ContractError::config_validation(
            "driver.output_namespace",
            format!("invalid character '{c}' in output_namespace '{ns}'"),
        ));
    }
    Ok(())
}

fn validate_serial_numbers(config: &BridgeConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sensor in &config.simulated_sensors {
        if !seen.insert(sensor.serial_number) {
            return Err(ContractError::config_validation(
                format!("simulated_sensors[serial_number={}]", sensor.serial_number),
                "duplicate serial_number",
            ));
        }
    }
    Ok(())
}

fn validate_simulated_sensors(config: &BridgeConfig) -> Result<(), ContractError> {
    for sensor in &config.simulated_sensors {
        let field = |name: &str| format!("simulated_sensors[{}].{name}", sensor.serial_number);

        let hz = sensor.frequency_hz;
        if !(hz.is_finite() && hz > 0.0) {
            return Err(ContractError::config_validation(
                field("frequency_hz"),
                format!("frequency_hz must be finite and > 0, got {hz}"),
            ));
        }
        if Duration::try_from_secs_f64(1.0 / hz).is_err() {
            return Err(ContractError::config_validation(
                field("frequency_hz"),
                format!("frequency_hz {hz} gives a batch period out of range"),
            ));
        }
        if sensor.points_per_batch == 0 {
            return Err(ContractError::config_validation(
                field("points_per_batch"),
                "points_per_batch must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&sensor.zero_distance_ratio) {
            return Err(ContractError::config_validation(
                field("zero_distance_ratio"),
                format!(
                    "zero_distance_ratio must be within [0, 1], got {}",
                    sensor.zero_distance_ratio
                ),
            ));
        }
    }
    Ok(())
}

fn validate_transport(config: &BridgeConfig) -> Result<(), ContractError> {
    let transport = &config.transport;
    if transport.transport_type == TransportType::File {
        if let Some(format) = transport.params.get("format") {
            if format != "json" && format != "bincode" {
                return Err(ContractError::config_validation(
                    "transport.params.format",
                    format!("unsupported file format '{format}', expected json or bincode"),
                ));
            }
        }
    }
    Ok(())
}
