//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Contract snapshot tests
//! - Simulated e2e tests (mock SDK, no hardware)
//! - Cross-crate property tests

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex, MutexGuard};

    use contracts::{SerialNumber, SimulatedSensorConfig};
    use sensor_sdk::{MockSdk, MockSdkConfig};

    // Driver is a process-wide singleton; tests using it take turns
    static DRIVER_LOCK: Mutex<()> = Mutex::new(());

    pub fn driver_lock() -> MutexGuard<'static, ()> {
        DRIVER_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn sensor(serial: u64) -> SimulatedSensorConfig {
        SimulatedSensorConfig {
            serial_number: SerialNumber(serial),
            model_name: "SIM".into(),
            model: 3,
            firmware_version: 12,
            frequency_hz: 10.0,
            points_per_batch: 32,
            zero_distance_ratio: 0.0,
        }
    }

    /// Mock SDK that only emits when the test asks it to
    pub fn manual_sdk(serials: &[u64]) -> Arc<MockSdk> {
        Arc::new(MockSdk::with_config(MockSdkConfig {
            sensors: serials.iter().map(|&s| sensor(s)).collect(),
            emit_on_listen: false,
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{CartesianPoint, Header, ImagePoint, Message, MessageKind, PointCloud, Time};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_message_kind_names() {
        assert_eq!(MessageKind::SensorInformation.as_str(), "sensor_information");
        assert_eq!(MessageKind::ImagePoints.as_str(), "image_points");
        assert_eq!(MessageKind::Points.as_str(), "points");
    }

    #[test]
    fn test_cloud_carries_frame_id() {
        let header = Header {
            stamp: Time::from_nanos(1_000),
            frame_id: "cepton_1001".into(),
        };
        let points = [ImagePoint {
            distance: 1.0,
            valid: true,
            ..Default::default()
        }
        .to_cartesian()];
        let message = Message::PointCloud(PointCloud::from_points::<CartesianPoint>(
            header, &points,
        ));

        assert_eq!(message.frame_id(), Some("cepton_1001"));
        assert_eq!(message.as_point_cloud().map(PointCloud::len), Some(1));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use bridge::DriverNode;
    use contracts::{
        BridgeConfig, CartesianPoint, ImagePoint, SdkEvent, SdkOptions, SensorHandle,
        SerialNumber,
    };
    use driver::{Driver, DriverError, DriverState, OnEventCallback, OnReceiveCallback};
    use publisher::MemoryTransport;

    use crate::support::{driver_lock, manual_sdk};

    fn point(timestamp: i64, distance: f32) -> ImagePoint {
        ImagePoint {
            timestamp,
            image_x: 0.0,
            distance,
            image_z: 0.0,
            intensity: 0.4,
            return_number: 0,
            valid: distance != 0.0,
        }
    }

    /// Scenario A: one batch, zero-distance points only in image space
    #[test]
    fn test_e2e_single_sensor_batch() {
        let _guard = driver_lock();
        let sdk = manual_sdk(&[1001]);
        let transport = MemoryTransport::new();

        let _node = DriverNode::start(
            &BridgeConfig::default(),
            sdk.clone(),
            Arc::new(transport.clone()),
        )
        .unwrap();

        let handle = sdk.handle_for(SerialNumber(1001)).unwrap();
        assert!(sdk.emit_points(handle, &[point(10, 0.0), point(11, 2.5), point(12, 0.0)]));

        let image = transport.messages_on("cepton_image_points_1001");
        assert_eq!(image.len(), 1);
        let image_cloud = image[0].as_point_cloud().unwrap();
        assert_eq!(image_cloud.len(), 3);
        assert_eq!(image[0].frame_id(), Some("cepton_1001"));

        let points = transport.messages_on("cepton_points_1001");
        assert_eq!(points.len(), 1);
        let decoded = points[0]
            .as_point_cloud()
            .unwrap()
            .decode_points::<CartesianPoint>()
            .unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].timestamp, 11);
        assert!((decoded[0].y - 2.5).abs() < 1e-6);
        assert!(decoded[0].x.abs() < 1e-6);
        assert!(decoded[0].z.abs() < 1e-6);

        let info = transport.messages_on("cepton_sensor_information");
        assert_eq!(info.len(), 1);
        let info = info[0].as_sensor_information().unwrap();
        assert_eq!(info.serial_number, SerialNumber(1001));
        assert_eq!(info.handle, handle);
    }

    /// Scenario B: combined addressing shares one channel pair
    #[test]
    fn test_e2e_combined_sensors_share_channels() {
        let _guard = driver_lock();
        let sdk = manual_sdk(&[1001, 1002]);
        let transport = MemoryTransport::new();
        let mut config = BridgeConfig::default();
        config.driver.combine_sensors = true;

        let _node =
            DriverNode::start(&config, sdk.clone(), Arc::new(transport.clone())).unwrap();

        for serial in [1001, 1002] {
            let handle = sdk.handle_for(SerialNumber(serial)).unwrap();
            assert!(sdk.emit_points(handle, &[point(1, 1.0), point(2, 0.0)]));
        }

        assert_eq!(transport.messages_on("cepton_image_points").len(), 2);
        assert_eq!(transport.messages_on("cepton_points").len(), 2);
        assert!(transport.messages_on("cepton_points_1001").is_empty());
        assert_eq!(transport.advertise_count("cepton_points"), 1);
        assert_eq!(transport.advertise_count("cepton_image_points"), 1);

        let serials: Vec<_> = transport
            .messages_on("cepton_sensor_information")
            .iter()
            .map(|m| m.as_sensor_information().unwrap().serial_number)
            .collect();
        assert_eq!(serials, vec![SerialNumber(1001), SerialNumber(1002)]);
    }

    /// Scenario C: a second initialize leaves the first registration intact
    #[test]
    fn test_e2e_double_initialize_keeps_registration() {
        let _guard = driver_lock();
        let sdk = manual_sdk(&[1001]);
        let driver = Driver::get_instance();

        let received = Arc::new(AtomicUsize::new(0));
        let on_receive: OnReceiveCallback = {
            let received = Arc::clone(&received);
            Arc::new(move |_: SensorHandle, points: &[ImagePoint]| {
                received.fetch_add(points.len(), Ordering::SeqCst);
            })
        };
        let on_event: OnEventCallback = Arc::new(|_: &SdkEvent<'_>| {});

        driver
            .initialize(
                sdk.clone(),
                &SdkOptions::default(),
                Arc::clone(&on_receive),
                Arc::clone(&on_event),
            )
            .unwrap();

        let second = driver.initialize(
            manual_sdk(&[]),
            &SdkOptions::default(),
            Arc::new(|_: SensorHandle, _: &[ImagePoint]| {}),
            on_event,
        );
        assert_eq!(second, Err(DriverError::AlreadyInitialized));
        assert_eq!(driver.state(), DriverState::Active);

        let handle = sdk.handle_for(SerialNumber(1001)).unwrap();
        assert!(sdk.emit_points(handle, &[point(1, 1.0), point(2, 2.0)]));
        assert_eq!(received.load(Ordering::SeqCst), 2);

        driver.deinitialize();
        assert_eq!(driver.state(), DriverState::Uninitialized);
        assert!(!sdk.emit_points(handle, &[point(3, 1.0)]));
        assert_eq!(received.load(Ordering::SeqCst), 2);
    }
}

#[cfg(test)]
mod property_tests {
    use std::io::Write;
    use std::sync::Arc;

    use bridge::DriverNode;
    use config_loader::ConfigLoader;
    use contracts::{
        CartesianPoint, ImagePoint, SdkErrorCode, SensorHandle, SerialNumber, Transport,
    };
    use driver::Driver;
    use publisher::{read_messages, FileFormat, FileTransport, MemoryTransport};
    use sensor_sdk::generate_batch;

    use crate::support::{driver_lock, manual_sdk, sensor};

    #[test]
    fn test_cartesian_count_matches_nonzero_distances() {
        let _guard = driver_lock();
        let sdk = manual_sdk(&[42]);
        let transport = MemoryTransport::new();
        let node = DriverNode::start(
            &contracts::BridgeConfig::default(),
            sdk.clone(),
            Arc::new(transport.clone()),
        )
        .unwrap();

        let mut config = sensor(42);
        config.points_per_batch = 200;
        config.zero_distance_ratio = 0.3;
        let batch: Vec<ImagePoint> = generate_batch(&config, 0);
        let expected: Vec<i64> = batch
            .iter()
            .filter(|p| p.has_return())
            .map(|p| p.timestamp)
            .collect();

        let handle = sdk.handle_for(SerialNumber(42)).unwrap();
        assert!(sdk.emit_points(handle, &batch));

        let cloud = &transport.messages_on("cepton_points_42")[0];
        let decoded = cloud
            .as_point_cloud()
            .unwrap()
            .decode_points::<CartesianPoint>()
            .unwrap();
        let timestamps: Vec<i64> = decoded.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, expected);

        let summary = node.stats().summary;
        assert_eq!(summary.total_points_in, 200);
        assert_eq!(summary.total_points_out, expected.len() as u64);
    }

    #[test]
    fn test_unknown_handle_publishes_nothing() {
        let _guard = driver_lock();
        let sdk = manual_sdk(&[1]);
        let transport = MemoryTransport::new();
        let node = DriverNode::start(
            &contracts::BridgeConfig::default(),
            sdk.clone(),
            Arc::new(transport.clone()),
        )
        .unwrap();

        assert!(sdk.emit_points(SensorHandle(0xdead), &[ImagePoint::default(); 3]));

        assert_eq!(transport.published_count(), 0);
        assert_eq!(node.stats().summary.dropped_batches, 1);
    }

    #[test]
    fn test_events_stop_after_deinitialize() {
        let _guard = driver_lock();
        let sdk = manual_sdk(&[]);
        let mut node = DriverNode::start(
            &contracts::BridgeConfig::default(),
            sdk.clone(),
            Arc::new(MemoryTransport::new()),
        )
        .unwrap();

        assert!(sdk.emit_event(SensorHandle(1), SdkErrorCode::FAULT_INTERNAL, "first"));
        node.stop();
        assert!(!sdk.emit_event(SensorHandle(1), SdkErrorCode::FAULT_INTERNAL, "second"));
        assert_eq!(node.stats().summary.sdk_events, 1);
        assert!(!Driver::get_instance().is_active());
    }

    #[test]
    fn test_config_file_to_file_transport() {
        let _guard = driver_lock();
        let out = tempfile::tempdir().unwrap();

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[driver]
output_namespace = "roof"

[transport]
transport_type = "file"

[transport.params]
base_path = "{}"
format = "bincode"

[[simulated_sensors]]
serial_number = 7
points_per_batch = 16
"#,
            out.path().display()
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        let transport = publisher::create_transport(&config.transport).unwrap();
        assert_eq!(transport.name(), "file");

        let sdk = manual_sdk(&[7]);
        let mut node = DriverNode::start(&config, sdk.clone(), transport).unwrap();
        let handle = sdk.handle_for(SerialNumber(7)).unwrap();
        let batch = generate_batch(&sensor(7), 0);
        assert!(sdk.emit_points(handle, &batch));
        assert!(sdk.emit_points(handle, &batch));
        node.stop();

        let paths = FileTransport::from_params(&config.transport.params).unwrap();
        let image = read_messages(
            &paths.topic_path("roof_image_points_7"),
            FileFormat::Bincode,
        )
        .unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(image[0].frame_id(), Some("roof_7"));
        assert_eq!(image[0].as_point_cloud().unwrap().len(), batch.len());

        let info = read_messages(
            &paths.topic_path("roof_sensor_information"),
            FileFormat::Bincode,
        )
        .unwrap();
        assert_eq!(info.len(), 2);
    }

    #[test]
    fn test_invalid_config_never_starts_driver() {
        let result = ConfigLoader::load_from_str(
            r#"{ "driver": { "output_namespace": "has space" } }"#,
            config_loader::ConfigFormat::Json,
        );
        assert!(result.is_err());
    }
}
