//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, MessageKind};
use publisher::{AddressingPolicy, PublisherKey, TopicNaming};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    driver: DriverInfo,
    transport: TransportInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sensors: Vec<SensorInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    topics: Vec<TopicInfo>,
}

#[derive(Serialize)]
struct DriverInfo {
    namespace: String,
    addressing: &'static str,
    control_flags: u32,
    frame_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture_path: Option<String>,
    capture_loop: bool,
}

#[derive(Serialize)]
struct TransportInfo {
    transport_type: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

#[derive(Serialize)]
struct SensorInfo {
    serial_number: u64,
    model_name: String,
    frequency_hz: f64,
    points_per_batch: usize,
    zero_distance_ratio: f64,
}

/// One channel the bridge will advertise
#[derive(Debug, Serialize, PartialEq, Eq)]
struct TopicInfo {
    topic: String,
    kind: &'static str,
    frame_id: Option<String>,
    queue_size: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn naming(config: &BridgeConfig) -> TopicNaming {
    TopicNaming::new(
        config.driver.output_namespace.clone(),
        AddressingPolicy::from_combine_flag(config.driver.combine_sensors),
    )
}

fn addressing_name(policy: AddressingPolicy) -> &'static str {
    match policy {
        AddressingPolicy::Combined => "combined",
        AddressingPolicy::PerSensor => "per_sensor",
    }
}

/// Channels advertised for the configured sensors, metadata first
fn planned_topics(config: &BridgeConfig) -> Vec<TopicInfo> {
    let naming = naming(config);
    let mut topics = vec![TopicInfo {
        topic: naming.metadata_topic(),
        kind: MessageKind::SensorInformation.as_str(),
        frame_id: None,
        queue_size: naming.queue_size(MessageKind::SensorInformation, PublisherKey::Combined),
    }];

    let mut keys: Vec<PublisherKey> = config
        .simulated_sensors
        .iter()
        .map(|s| naming.key_for(s.serial_number))
        .collect();
    if naming.policy() == AddressingPolicy::Combined {
        keys = vec![PublisherKey::Combined];
    }
    keys.dedup();

    for key in keys {
        for kind in [MessageKind::ImagePoints, MessageKind::Points] {
            topics.push(TopicInfo {
                topic: naming.topic(kind, key),
                kind: kind.as_str(),
                frame_id: Some(naming.frame_id(key)),
                queue_size: naming.queue_size(kind, key),
            });
        }
    }

    topics
}

fn build_config_info(config: &BridgeConfig, args: &InfoArgs) -> ConfigInfo {
    let sensors = if args.sensors {
        config
            .simulated_sensors
            .iter()
            .map(|s| SensorInfo {
                serial_number: s.serial_number.0,
                model_name: s.model_name.clone(),
                frequency_hz: s.frequency_hz,
                points_per_batch: s.points_per_batch,
                zero_distance_ratio: s.zero_distance_ratio,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        driver: DriverInfo {
            namespace: config.driver.output_namespace.clone(),
            addressing: addressing_name(AddressingPolicy::from_combine_flag(
                config.driver.combine_sensors,
            )),
            control_flags: config.driver.control_flags,
            frame_mode: format!("{:?}", config.driver.frame_mode),
            capture_path: config
                .driver
                .capture_path
                .as_ref()
                .map(|p| p.display().to_string()),
            capture_loop: config.driver.capture_loop,
        },
        transport: TransportInfo {
            transport_type: format!("{:?}", config.transport.transport_type),
            params: config.transport.params.clone(),
        },
        sensors,
        topics: if args.topics {
            planned_topics(config)
        } else {
            Vec::new()
        },
    }
}

fn print_config_info(config: &BridgeConfig, args: &InfoArgs) {
    let driver = &config.driver;
    let policy = AddressingPolicy::from_combine_flag(driver.combine_sensors);

    println!("\n=== Lidar Bridge Configuration ===\n");
    println!("Version: {:?}", config.version);

    println!("\nDriver:");
    println!("  Namespace: {}", driver.output_namespace);
    println!("  Addressing: {}", addressing_name(policy));
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

    println!("\nSimulated sensors: {}", config.simulated_sensors.len());
    if args.sensors {
        for sensor in &config.simulated_sensors {
            println!("  📡 {} ({})", sensor.serial_number, sensor.model_name);
            println!("     ├─ Frequency: {} Hz", sensor.frequency_hz);
            println!("     ├─ Points per batch: {}", sensor.points_per_batch);
            println!("     └─ Zero-distance ratio: {}", sensor.zero_distance_ratio);
        }
    }

    if args.topics {
        println!("\nTopics:");
        for topic in planned_topics(config) {
            match topic.frame_id {
                Some(frame_id) => println!(
                    "  - {} [{}] frame_id={} queue={}",
                    topic.topic, topic.kind, frame_id, topic.queue_size
                ),
                None => println!(
                    "  - {} [{}] queue={}",
                    topic.topic, topic.kind, topic.queue_size
                ),
            }
        }
    }

    println!();
}
