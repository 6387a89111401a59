//! DriverNode - wires the processor to the driver singleton

use std::fmt;
use std::sync::Arc;

use contracts::{BridgeConfig, ImagePoint, SdkEvent, SensorHandle, SensorSdk, Transport};
use driver::{Driver, OnEventCallback, OnReceiveCallback};
use observability::MetricsSummary;
use publisher::{AddressingPolicy, MetricsSnapshot, TopicNaming};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::processor::BatchProcessor;

/// Runtime statistics of a node
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    pub summary: MetricsSummary,
    /// Per-topic channel metrics
    pub channels: Vec<(String, MetricsSnapshot)>,
}

impl fmt::Display for NodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        if !self.channels.is_empty() {
            writeln!(f, "Channels:")?;
            for (topic, m) in &self.channels {
                writeln!(
                    f,
                    "  {topic}: {} published, {} failed, {} points",
                    m.publish_count, m.failure_count, m.point_count
                )?;
            }
        }
        Ok(())
    }
}

/// A running bridge
///
/// Holds the driver registration for as long as it lives; dropping the node
/// deinitializes the driver.
pub struct DriverNode {
    processor: Arc<BatchProcessor>,
    driver: &'static Driver,
    running: bool,
}

impl DriverNode {
    /// Build the pipeline, register with the SDK and start replay if configured.
    ///
    /// # Errors
    /// Any startup failure. If the driver was already registered by this call
    /// it is deinitialized before the error is returned.
    #[instrument(
        name = "driver_node_start",
        skip_all,
        fields(
            namespace = %config.driver.output_namespace,
            combine_sensors = config.driver.combine_sensors,
            transport = transport.name()
        )
    )]
    pub fn start(
        config: &BridgeConfig,
        sdk: Arc<dyn SensorSdk>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let naming = TopicNaming::new(
            config.driver.output_namespace.clone(),
            AddressingPolicy::from_combine_flag(config.driver.combine_sensors),
        );
        let processor = Arc::new(BatchProcessor::new(Arc::clone(&sdk), naming, transport)?);
        processor.prewarm()?;

        let on_receive: OnReceiveCallback = {
            let processor = Arc::clone(&processor);
            Arc::new(move |handle: SensorHandle, points: &[ImagePoint]| {
                // Logged and counted inside the processor
                if let Err(e) = processor.handle_batch(handle, points) {
                    debug!(error = %e, "batch not published");
                }
            })
        };
        let on_event: OnEventCallback = {
            let processor = Arc::clone(&processor);
            Arc::new(move |event: &SdkEvent<'_>| {
                processor.handle_event(event);
            })
        };

        let driver = Driver::get_instance();
        driver.initialize(sdk, &config.driver.sdk_options(), on_receive, on_event)?;
        observability::record_driver_active(true);

        let node = Self {
            processor,
            driver,
            running: true,
        };

        // On error `node` drops here and deinitializes the driver
        if let Some(path) = &config.driver.capture_path {
            node.driver
                .start_capture_replay(path, config.driver.capture_loop)?;
        }

        info!("driver node started");
        Ok(node)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn processor(&self) -> &Arc<BatchProcessor> {
        &self.processor
    }

    /// Deinitialize the driver. Idempotent.
    #[instrument(name = "driver_node_stop", skip(self))]
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.driver.deinitialize();
        observability::record_driver_active(false);
        info!("driver node stopped");
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            summary: self.processor.summary(),
            channels: self.processor.channel_metrics(),
        }
    }
}

impl Drop for DriverNode {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SdkErrorCode, SerialNumber};
    use driver::{DriverError, DriverState};
    use publisher::MemoryTransport;
    use sensor_sdk::{MockSdk, MockSdkConfig};
    use std::sync::{Mutex, MutexGuard};

    // The driver is process-wide; node tests take turns
    static DRIVER_LOCK: Mutex<()> = Mutex::new(());

    fn driver_lock() -> MutexGuard<'static, ()> {
        DRIVER_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn quiet_sdk(config: MockSdkConfig) -> Arc<MockSdk> {
        Arc::new(MockSdk::with_config(MockSdkConfig {
            emit_on_listen: false,
            ..config
        }))
    }

    fn sensor_config(serial: u64) -> contracts::SimulatedSensorConfig {
        contracts::SimulatedSensorConfig {
            serial_number: SerialNumber(serial),
            model_name: "SIM".into(),
            model: 0,
            firmware_version: 0,
            frequency_hz: 10.0,
            points_per_batch: 8,
            zero_distance_ratio: 0.0,
        }
    }

    #[test]
    fn test_start_routes_batches_and_stop_deinitializes() {
        let _guard = driver_lock();
        let sdk = quiet_sdk(MockSdkConfig {
            sensors: vec![sensor_config(1001)],
            ..Default::default()
        });
        let transport = MemoryTransport::new();

        let mut node = DriverNode::start(
            &BridgeConfig::default(),
            sdk.clone(),
            Arc::new(transport.clone()),
        )
        .unwrap();
        assert!(Driver::get_instance().is_active());

        let handle = sdk.handle_for(SerialNumber(1001)).unwrap();
        assert!(sdk.emit_points(handle, &[ImagePoint::default(); 4]));
        assert_eq!(transport.messages_on("cepton_image_points_1001").len(), 1);
        assert_eq!(node.stats().summary.total_batches, 1);

        node.stop();
        assert_eq!(Driver::get_instance().state(), DriverState::Uninitialized);
        assert!(!sdk.is_initialized());
        assert!(!sdk.emit_points(handle, &[ImagePoint::default()]));
    }

    #[test]
    fn test_capture_failure_is_fatal() {
        let _guard = driver_lock();
        let file = tempfile::NamedTempFile::new().unwrap();
        let sdk = quiet_sdk(MockSdkConfig {
            fail_capture_resume: Some(SdkErrorCode::ERROR_CORRUPT_FILE),
            ..Default::default()
        });
        let mut config = BridgeConfig::default();
        config.driver.capture_path = Some(file.path().to_path_buf());

        let err = DriverNode::start(&config, sdk.clone(), Arc::new(MemoryTransport::new()))
            .err()
            .unwrap();
        assert_eq!(err.code(), Some(SdkErrorCode::ERROR_CORRUPT_FILE));
        assert!(err.to_string().contains("capture_replay_resume"));
        assert_eq!(Driver::get_instance().state(), DriverState::Uninitialized);
        assert!(!sdk.is_initialized());
    }

    #[test]
    fn test_second_node_rejected() {
        let _guard = driver_lock();
        let first = quiet_sdk(MockSdkConfig::default());
        let _node = DriverNode::start(
            &BridgeConfig::default(),
            first.clone(),
            Arc::new(MemoryTransport::new()),
        )
        .unwrap();

        let second = quiet_sdk(MockSdkConfig::default());
        let err = DriverNode::start(
            &BridgeConfig::default(),
            second,
            Arc::new(MemoryTransport::new()),
        )
        .err()
        .unwrap();

        assert!(matches!(
            err,
            crate::BridgeError::Driver(DriverError::AlreadyInitialized)
        ));
        assert!(Driver::get_instance().is_active());
        assert!(first.is_listening());
    }

    #[test]
    fn test_events_reach_processor() {
        let _guard = driver_lock();
        let sdk = quiet_sdk(MockSdkConfig::default());
        let node = DriverNode::start(
            &BridgeConfig::default(),
            sdk.clone(),
            Arc::new(MemoryTransport::new()),
        )
        .unwrap();

        assert!(sdk.emit_event(
            SensorHandle(1),
            SdkErrorCode::FAULT_EXTREME_HUMIDITY,
            "humid"
        ));
        assert_eq!(node.stats().summary.sdk_events, 1);
    }

    #[test]
    fn test_stats_display() {
        let stats = NodeStats {
            summary: MetricsSummary::default(),
            channels: vec![("cepton_points".into(), MetricsSnapshot::default())],
        };
        let output = stats.to_string();
        assert!(output.contains("Bridge Metrics Summary"));
        assert!(output.contains("cepton_points: 0 published"));
    }
}
