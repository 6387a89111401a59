//! Channel metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{Channel, ContractError, Message};

/// Metrics for a single channel
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Messages accepted by the transport
    publish_count: AtomicU64,
    /// Messages the transport rejected
    failure_count: AtomicU64,
    /// Points carried by accepted point clouds
    point_count: AtomicU64,
}

impl ChannelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn point_count(&self) -> u64 {
        self.point_count.load(Ordering::Relaxed)
    }

    fn record_publish(&self, points: usize) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        self.point_count.fetch_add(points as u64, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            publish_count: self.publish_count(),
            failure_count: self.failure_count(),
            point_count: self.point_count(),
        }
    }
}

/// Snapshot of channel metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub publish_count: u64,
    pub failure_count: u64,
    pub point_count: u64,
}

/// Channel wrapper counting publishes and failures
pub struct MeteredChannel {
    inner: Arc<dyn Channel>,
    metrics: ChannelMetrics,
}

impl MeteredChannel {
    pub fn new(inner: Arc<dyn Channel>) -> Self {
        Self {
            inner,
            metrics: ChannelMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &ChannelMetrics {
        &self.metrics
    }

    /// The wrapped transport channel
    pub fn inner(&self) -> &Arc<dyn Channel> {
        &self.inner
    }
}

impl Channel for MeteredChannel {
    fn topic(&self) -> &str {
        self.inner.topic()
    }

    fn publish(&self, message: Message) -> Result<(), ContractError> {
        let points = message.as_point_cloud().map_or(0, |cloud| cloud.len());
        match self.inner.publish(message) {
            Ok(()) => {
                self.metrics.record_publish(points);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Header, ImagePoint, PointCloud};

    struct FlakyChannel {
        fail: bool,
    }

    impl Channel for FlakyChannel {
        fn topic(&self) -> &str {
            "flaky"
        }

        fn publish(&self, _message: Message) -> Result<(), ContractError> {
            if self.fail {
                Err(ContractError::publish("flaky", "mock failure"))
            } else {
                Ok(())
            }
        }
    }

    fn cloud(points: usize) -> Message {
        Message::PointCloud(PointCloud::from_points(
            Header::default(),
            &vec![ImagePoint::default(); points],
        ))
    }

    #[test]
    fn test_counts_points_on_success() {
        let channel = MeteredChannel::new(Arc::new(FlakyChannel { fail: false }));
        channel.publish(cloud(5)).unwrap();
        channel.publish(cloud(3)).unwrap();

        let snapshot = channel.metrics().snapshot();
        assert_eq!(snapshot.publish_count, 2);
        assert_eq!(snapshot.point_count, 8);
        assert_eq!(snapshot.failure_count, 0);
    }

    #[test]
    fn test_counts_failures() {
        let channel = MeteredChannel::new(Arc::new(FlakyChannel { fail: true }));
        assert!(channel.publish(cloud(5)).is_err());

        let snapshot = channel.metrics().snapshot();
        assert_eq!(snapshot.publish_count, 0);
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(channel.topic(), "flaky");
    }
}
