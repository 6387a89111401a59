//! BatchProcessor - per-callback pipeline
//!
//! lookup → frame → metadata → image-space cloud → Cartesian cloud

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use contracts::{ImagePoint, SdkEvent, SensorHandle, SensorSdk, SerialNumber, Transport};
use observability::{BatchSample, BatchStatsAggregator, MetricsSummary};
use publisher::{FramePublisher, MetricsSnapshot, SensorInfoReporter, TopicNaming};
use tracing::{trace, warn};

use crate::error::{BridgeError, Result};
use crate::frame::{CoordinateConverter, FrameAssembler};

/// What happened to one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub handle: SensorHandle,
    pub serial_number: SerialNumber,
    /// Points delivered by the SDK
    pub image_points: usize,
    /// Points with a return
    pub cartesian_points: usize,
    /// Messages accepted, metadata included
    pub published: usize,
    pub failed: usize,
}

/// Handles SDK callbacks for every sensor
///
/// Shared across SDK threads; each call owns its buffers.
pub struct BatchProcessor {
    assembler: FrameAssembler,
    converter: CoordinateConverter,
    reporter: SensorInfoReporter,
    publisher: FramePublisher,
    stats: Mutex<BatchStatsAggregator>,
}

impl BatchProcessor {
    /// Build the pipeline; advertises the metadata channel.
    pub fn new(
        sdk: Arc<dyn SensorSdk>,
        naming: TopicNaming,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let reporter = SensorInfoReporter::new(&naming, transport.as_ref())?;
        Ok(Self {
            assembler: FrameAssembler::new(Arc::clone(&sdk)),
            converter: CoordinateConverter::new(sdk),
            reporter,
            publisher: FramePublisher::new(naming, transport),
            stats: Mutex::new(BatchStatsAggregator::new()),
        })
    }

    fn stats(&self) -> MutexGuard<'_, BatchStatsAggregator> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn naming(&self) -> &TopicNaming {
        self.publisher.naming()
    }

    /// Advertise shared point channels (combined mode only)
    pub fn prewarm(&self) -> Result<()> {
        Ok(self.publisher.prewarm()?)
    }

    /// Process one SDK batch.
    ///
    /// # Errors
    /// `SensorInfoLookupFailed`: nothing is published for the batch. Publish
    /// failures are not errors; they show up in the report.
    pub fn handle_batch(&self, handle: SensorHandle, points: &[ImagePoint]) -> Result<BatchReport> {
        let started = Instant::now();

        let frame = match self.assembler.assemble(handle, points) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(handle = %handle, points = points.len(), error = %e, "batch dropped");
                self.stats().record_dropped();
                observability::record_batch_dropped("sensor_info_lookup");
                return Err(e);
            }
        };

        let serial_number = frame.info.serial_number;
        let key = self.naming().key_for(serial_number);
        let mut report = BatchReport {
            handle,
            serial_number,
            image_points: frame.len(),
            cartesian_points: 0,
            published: 0,
            failed: 0,
        };

        match self.reporter.report(&frame.info) {
            Ok(()) => report.published += 1,
            Err(e) => {
                report.failed += 1;
                warn!(serial_number = %serial_number, error = %e, "sensor information publish failed");
            }
        }

        let cartesian = self.converter.convert(&frame.points);
        report.cartesian_points = cartesian.len();

        let outcome = self
            .publisher
            .publish(key, frame.stamp, &frame.points, &cartesian);
        report.published += outcome.published;
        report.failed += outcome.failed;

        let sample = BatchSample {
            serial_number,
            points_in: report.image_points,
            points_out: report.cartesian_points,
            published: report.published,
            publish_failures: report.failed,
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        observability::record_batch(&sample);
        self.stats().update(&sample);

        trace!(
            serial_number = %serial_number,
            image_points = report.image_points,
            cartesian_points = report.cartesian_points,
            published = report.published,
            "batch handled"
        );
        Ok(report)
    }

    /// Log an SDK runtime event and return it as an error value
    pub fn handle_event(&self, event: &SdkEvent<'_>) -> BridgeError {
        warn!(
            handle = %event.handle,
            code = %event.code,
            fault = event.code.is_fault(),
            message = event.message,
            "SDK event"
        );
        self.stats().record_event();
        observability::record_sdk_event(event.code);

        BridgeError::SdkRuntimeEvent {
            handle: event.handle,
            code: event.code,
            message: event.message.to_string(),
        }
    }

    /// Aggregated batch statistics
    pub fn summary(&self) -> MetricsSummary {
        self.stats().summary()
    }

    /// Per-topic channel metrics, metadata channel first
    pub fn channel_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut metrics = vec![self.reporter.metrics()];
        metrics.extend(self.publisher.metrics());
        metrics
    }
}
