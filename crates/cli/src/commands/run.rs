//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        namespace = %config.driver.output_namespace,
        combine_sensors = config.driver.combine_sensors,
        capture = ?config.driver.capture_path,
        transport = ?config.transport.transport_type,
        sensors = config.simulated_sensors.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let session = Session::new(SessionConfig {
        config,
        max_batches: non_zero(args.max_batches),
        timeout: non_zero(args.timeout).map(Duration::from_secs),
        stats_interval: non_zero(args.stats_interval).map(Duration::from_secs),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!("Starting bridge...");
    let stats = session
        .run(shutdown_signal())
        .await
        .context("Bridge execution failed")?;

    info!(
        reason = %stats.reason,
        batches = stats.node.summary.total_batches,
        messages = stats.node.summary.messages_published,
        duration_secs = stats.duration.as_secs_f64(),
        rate = format!("{:.2}", stats.batch_rate()),
        "Bridge stopped"
    );
    stats.print_summary();

    info!("Lidar Bridge finished");
    Ok(())
}

fn non_zero(value: u64) -> Option<u64> {
    (value != 0).then_some(value)
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(config: &mut BridgeConfig, args: &RunArgs) {
    if let Some(ref path) = args.capture_path {
        info!(path = %path.display(), "Overriding capture path from CLI");
        config.driver.capture_path = Some(path.clone());
    }
    if args.no_loop {
        config.driver.capture_loop = false;
    }
    if args.combine_sensors {
        config.driver.combine_sensors = true;
    }
    if let Some(ref namespace) = args.namespace {
        info!(namespace = %namespace, "Overriding output namespace from CLI");
        config.driver.output_namespace = namespace.clone();
    }
    if let Some(flags) = args.control_flags {
        config.driver.control_flags = flags;
    }
    if let Some(transport) = args.transport {
        config.transport.transport_type = transport.into();
    }
    if let Some(ref dir) = args.output_dir {
        config
            .transport
            .params
            .insert("base_path".to_string(), dir.display().to_string());
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &BridgeConfig) {
    let driver = &config.driver;

    println!("\n=== Configuration Summary ===\n");
    println!("Driver:");
    println!("  Namespace: {}", driver.output_namespace);
    println!("  Combine sensors: {}", driver.combine_sensors);
    println!("  Control flags: {:#x}", driver.control_flags);
    println!("  Frame mode: {:?}", driver.frame_mode);
    match &driver.capture_path {
        Some(path) => println!(
            "  Capture: {} (loop: {})",
            path.display(),
            driver.capture_loop
        ),
        None => println!("  Capture: live sensors"),
    }

    println!("\nTransport: {:?}", config.transport.transport_type);
    for (key, value) in &config.transport.params {
        println!("  {key} = {value}");
    }

    println!("\nSimulated sensors ({}):", config.simulated_sensors.len());
    for sensor in &config.simulated_sensors {
        println!(
            "  - {} ({}) - {} points @ {} Hz",
            sensor.serial_number, sensor.model_name, sensor.points_per_batch, sensor.frequency_hz
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use contracts::TransportType;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["lidar-bridge", "run"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = BridgeConfig::default();
        apply_overrides(&mut config, &run_args(&[]));

        assert_eq!(config.driver.output_namespace, "cepton");
        assert!(config.driver.capture_loop);
        assert!(!config.driver.combine_sensors);
        assert_eq!(config.transport.transport_type, TransportType::Log);
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = BridgeConfig::default();
        let args = run_args(&[
            "--capture-path",
            "/data/drive.pcap",
            "--no-loop",
            "--combine-sensors",
            "--namespace",
            "roof",
            "--control-flags",
            "5",
            "--transport",
            "file",
            "--output-dir",
            "/tmp/out",
        ]);
        apply_overrides(&mut config, &args);

        assert_eq!(
            config.driver.capture_path.as_deref(),
            Some(std::path::Path::new("/data/drive.pcap"))
        );
        assert!(!config.driver.capture_loop);
        assert!(config.driver.combine_sensors);
        assert_eq!(config.driver.output_namespace, "roof");
        assert_eq!(config.driver.control_flags, 5);
        assert_eq!(config.transport.transport_type, TransportType::File);
        assert_eq!(config.transport.params["base_path"], "/tmp/out");
    }

    #[test]
    fn test_invalid_namespace_override_rejected() {
        let mut config = BridgeConfig::default();
        apply_overrides(&mut config, &run_args(&["--namespace", "bad name"]));
        assert!(config_loader::ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_non_zero() {
        assert_eq!(non_zero(0), None);
        assert_eq!(non_zero(3), Some(3));
    }
}
