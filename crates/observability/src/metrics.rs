//! Bridge metrics
//!
//! Records handled batches, publish failures and SDK events, and aggregates
//! run statistics in memory.

use std::collections::BTreeMap;

use contracts::{SdkErrorCode, SerialNumber};
use metrics::{counter, gauge, histogram};

/// One successfully handled batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSample {
    pub serial_number: SerialNumber,
    /// Points delivered by the SDK
    pub points_in: usize,
    /// Points surviving the zero-distance filter
    pub points_out: usize,
    /// Messages accepted by the transport (metadata included)
    pub published: usize,
    /// Messages rejected by the transport
    pub publish_failures: usize,
    /// Time spent in the callback (ms)
    pub latency_ms: f64,
}

/// Record one handled batch
///
/// Called once per SDK callback.
pub fn record_batch(sample: &BatchSample) {
    let serial = sample.serial_number.to_string();

    counter!("lidar_bridge_batches_total", "serial_number" => serial.clone()).increment(1);
    counter!("lidar_bridge_points_received_total", "serial_number" => serial.clone())
        .increment(sample.points_in as u64);
    counter!("lidar_bridge_points_converted_total", "serial_number" => serial)
        .increment(sample.points_out as u64);
    counter!("lidar_bridge_messages_published_total").increment(sample.published as u64);

    if sample.publish_failures > 0 {
        counter!("lidar_bridge_publish_failures_total").increment(sample.publish_failures as u64);
    }

    histogram!("lidar_bridge_batch_points").record(sample.points_in as f64);
    histogram!("lidar_bridge_batch_latency_ms").record(sample.latency_ms);
}

/// Record a dropped batch
pub fn record_batch_dropped(reason: &'static str) {
    counter!("lidar_bridge_batches_dropped_total", "reason" => reason).increment(1);
}

/// Record an SDK runtime event
pub fn record_sdk_event(code: SdkErrorCode) {
    counter!(
        "lidar_bridge_sdk_events_total",
        "code" => code.name(),
        "fault" => if code.is_fault() { "true" } else { "false" }
    )
    .increment(1);
}

/// Record whether the driver is Active
pub fn record_driver_active(active: bool) {
    gauge!("lidar_bridge_driver_active").set(if active { 1.0 } else { 0.0 });
}

/// Batch metrics aggregator
///
/// Aggregates in memory for end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct BatchStatsAggregator {
    pub total_batches: u64,
    pub dropped_batches: u64,
    pub total_points_in: u64,
    pub total_points_out: u64,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub sdk_events: u64,
    pub batch_points: RunningStats,
    pub latency_ms: RunningStats,
    pub per_sensor_batches: BTreeMap<SerialNumber, u64>,
}

impl BatchStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: &BatchSample) {
        self.total_batches += 1;
        self.total_points_in += sample.points_in as u64;
        self.total_points_out += sample.points_out as u64;
        self.messages_published += sample.published as u64;
        self.publish_failures += sample.publish_failures as u64;
        self.batch_points.push(sample.points_in as f64);
        self.latency_ms.push(sample.latency_ms);
        *self
            .per_sensor_batches
            .entry(sample.serial_number)
            .or_insert(0) += 1;
    }

    pub fn record_dropped(&mut self) {
        self.dropped_batches += 1;
    }

    pub fn record_event(&mut self) {
        self.sdk_events += 1;
    }

    /// Build a summary
    pub fn summary(&self) -> MetricsSummary {
        let offered = self.total_batches + self.dropped_batches;
        MetricsSummary {
            total_batches: self.total_batches,
            dropped_batches: self.dropped_batches,
            drop_rate: if offered > 0 {
                self.dropped_batches as f64 / offered as f64 * 100.0
            } else {
                0.0
            },
            total_points_in: self.total_points_in,
            total_points_out: self.total_points_out,
            return_rate: if self.total_points_in > 0 {
                self.total_points_out as f64 / self.total_points_in as f64 * 100.0
            } else {
                0.0
            },
            messages_published: self.messages_published,
            publish_failures: self.publish_failures,
            sdk_events: self.sdk_events,
            batch_points: StatsSummary::from(&self.batch_points),
            latency_ms: StatsSummary::from(&self.latency_ms),
            per_sensor_batches: self.per_sensor_batches.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub dropped_batches: u64,
    pub drop_rate: f64,
    pub total_points_in: u64,
    pub total_points_out: u64,
    pub return_rate: f64,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub sdk_events: u64,
    pub batch_points: StatsSummary,
    pub latency_ms: StatsSummary,
    pub per_sensor_batches: BTreeMap<SerialNumber, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Bridge Metrics Summary ===")?;
        writeln!(f, "Batches handled: {}", self.total_batches)?;
        writeln!(
            f,
            "Batches dropped: {} ({:.2}%)",
            self.dropped_batches, self.drop_rate
        )?;
        writeln!(
            f,
            "Points: {} in, {} with return ({:.2}%)",
            self.total_points_in, self.total_points_out, self.return_rate
        )?;
        writeln!(
            f,
            "Messages: {} published, {} failed",
            self.messages_published, self.publish_failures
        )?;
        writeln!(f, "SDK events: {}", self.sdk_events)?;
        writeln!(f, "Points per batch: {}", self.batch_points)?;
        writeln!(f, "Callback latency (ms): {}", self.latency_ms)?;

        if !self.per_sensor_batches.is_empty() {
            writeln!(f, "Batches per sensor:")?;
            for (serial, count) in &self.per_sensor_batches {
                writeln!(f, "  {}: {}", serial, count)?;
            }
        }

        Ok(())
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Running statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
