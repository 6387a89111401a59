//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, TransportType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    namespace: String,
    combine_sensors: bool,
    transport: String,
    capture_path: Option<String>,
    sensor_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    namespace: config.driver.output_namespace.clone(),
                    combine_sensors: config.driver.combine_sensors,
                    transport: format!("{:?}", config.transport.transport_type),
                    capture_path: config
                        .driver
                        .capture_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    sensor_count: config.simulated_sensors.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.simulated_sensors.is_empty() {
        warnings.push("No simulated sensors configured - no batches will be produced".to_string());
    }

    if let Some(ref path) = config.driver.capture_path {
        if !path.is_file() {
            warnings.push(format!(
                "Capture file '{}' does not exist - replay will fail at startup",
                path.display()
            ));
        }
    }

    if config.driver.combine_sensors && config.simulated_sensors.len() == 1 {
        warnings.push("combine_sensors has no effect with a single sensor".to_string());
    }

    for sensor in &config.simulated_sensors {
        if sensor.zero_distance_ratio >= 1.0 {
            warnings.push(format!(
                "Sensor {} never produces a return - its Cartesian clouds will be empty",
                sensor.serial_number
            ));
        }
    }

    if config.transport.transport_type == TransportType::Memory {
        warnings.push("Memory transport keeps messages in-process only".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Namespace: {}", summary.namespace);
            println!("  Combine sensors: {}", summary.combine_sensors);
            println!("  Transport: {}", summary.transport);
            if let Some(ref capture) = summary.capture_path {
                println!("  Capture: {}", capture);
            }
            println!("  Simulated sensors: {}", summary.sensor_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config: path,
            json: true,
        }
    }

    #[test]
    fn test_valid_config_with_summary() {
        let file = write_config(
            r#"
[driver]
output_namespace = "roof"

[[simulated_sensors]]
serial_number = 1001
"#,
        );

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.namespace, "roof");
        assert_eq!(summary.sensor_count, 1);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/bridge.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let file = write_config(
            r#"
[driver]
output_namespace = ""
"#,
        );

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("output_namespace"));
    }

    #[test]
    fn test_warnings() {
        let mut config = BridgeConfig::default();
        config.driver.capture_path = Some("/nonexistent/drive.pcap".into());
        config.transport.transport_type = TransportType::Memory;

        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("No simulated sensors"));
        assert!(warnings[1].contains("drive.pcap"));
    }
}
