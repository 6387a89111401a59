//! FramePublisher - publishes the two point clouds of a batch

use std::sync::Arc;

use chrono::Utc;
use contracts::{
    CartesianPoint, Channel, Header, ImagePoint, Message, MessageKind, PointCloud, Time, Transport,
};
use tracing::warn;

use crate::addressing::{PublisherKey, TopicNaming};
use crate::error::{PublisherError, Result};
use crate::metrics::MetricsSnapshot;
use crate::registry::PublisherRegistry;

/// Wall-clock stamp for a batch arriving now
pub fn stamp_now() -> Time {
    Time::from_nanos(Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// Messages out of one `publish` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub published: usize,
    pub failed: usize,
}

/// Publishes image-space and Cartesian clouds through one registry per kind
pub struct FramePublisher {
    naming: TopicNaming,
    image_points: PublisherRegistry,
    points: PublisherRegistry,
}

impl FramePublisher {
    pub fn new(naming: TopicNaming, transport: Arc<dyn Transport>) -> Self {
        Self {
            image_points: PublisherRegistry::new(
                MessageKind::ImagePoints,
                naming.clone(),
                Arc::clone(&transport),
            ),
            points: PublisherRegistry::new(MessageKind::Points, naming.clone(), transport),
            naming,
        }
    }

    pub fn naming(&self) -> &TopicNaming {
        &self.naming
    }

    /// Registry for `kind`; metadata has no registry
    pub fn registry(&self, kind: MessageKind) -> Option<&PublisherRegistry> {
        match kind {
            MessageKind::ImagePoints => Some(&self.image_points),
            MessageKind::Points => Some(&self.points),
            MessageKind::SensorInformation => None,
        }
    }

    /// Advertise the shared channels in combined mode
    pub fn prewarm(&self) -> Result<()> {
        self.image_points.prewarm()?;
        self.points.prewarm()
    }

    /// Publish both clouds of a batch under `key`.
    ///
    /// A failure on one channel is logged and counted; the other cloud is
    /// still attempted.
    pub fn publish(
        &self,
        key: PublisherKey,
        stamp: Time,
        image_points: &[ImagePoint],
        points: &[CartesianPoint],
    ) -> PublishOutcome {
        let header = Header {
            stamp,
            frame_id: self.naming.frame_id(key),
        };

        let image_cloud = PointCloud::from_points(header.clone(), image_points);
        let cartesian_cloud = PointCloud::from_points(header, points);

        let mut outcome = PublishOutcome::default();
        for (registry, cloud) in [
            (&self.image_points, image_cloud),
            (&self.points, cartesian_cloud),
        ] {
            match Self::publish_on(registry, key, cloud) {
                Ok(()) => outcome.published += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!(kind = registry.kind().as_str(), %key, error = %e, "point cloud publish failed");
                }
            }
        }
        outcome
    }

    fn publish_on(registry: &PublisherRegistry, key: PublisherKey, cloud: PointCloud) -> Result<()> {
        let channel = registry.resolve(key)?;
        channel
            .publish(Message::PointCloud(cloud))
            .map_err(|e| PublisherError::publish(channel.topic(), e))
    }

    /// Per-topic metrics of both registries
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut metrics = self.image_points.metrics();
        metrics.extend(self.points.metrics());
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::AddressingPolicy;
    use crate::transports::MemoryTransport;
    use contracts::SerialNumber;

    fn image_points() -> Vec<ImagePoint> {
        vec![
            ImagePoint {
                timestamp: 1,
                distance: 2.0,
                valid: true,
                ..Default::default()
            },
            ImagePoint {
                timestamp: 2,
                ..Default::default()
            },
        ]
    }

    fn publisher(policy: AddressingPolicy, transport: &MemoryTransport) -> FramePublisher {
        FramePublisher::new(TopicNaming::new("cepton", policy), Arc::new(transport.clone()))
    }

    #[test]
    fn test_publishes_both_clouds() {
        let transport = MemoryTransport::new();
        let publisher = publisher(AddressingPolicy::PerSensor, &transport);
        let image = image_points();
        let cartesian: Vec<_> = image
            .iter()
            .filter(|p| p.has_return())
            .map(ImagePoint::to_cartesian)
            .collect();
        let stamp = Time { sec: 3, nanosec: 4 };

        let key = PublisherKey::Sensor(SerialNumber(1001));
        let outcome = publisher.publish(key, stamp, &image, &cartesian);
        assert_eq!(outcome, PublishOutcome { published: 2, failed: 0 });

        let image_msgs = transport.messages_on("cepton_image_points_1001");
        let cloud = image_msgs[0].as_point_cloud().unwrap();
        assert_eq!(cloud.header.frame_id, "cepton_1001");
        assert_eq!(cloud.header.stamp, stamp);
        assert_eq!(cloud.width, 2);
        assert_eq!(cloud.height, 1);
        assert_eq!(cloud.decode_points::<ImagePoint>().unwrap(), image);

        let points_msgs = transport.messages_on("cepton_points_1001");
        let cloud = points_msgs[0].as_point_cloud().unwrap();
        assert_eq!(cloud.width, 1);
        assert_eq!(cloud.decode_points::<CartesianPoint>().unwrap(), cartesian);
    }

    #[test]
    fn test_image_cloud_published_first() {
        let transport = MemoryTransport::new();
        let publisher = publisher(AddressingPolicy::Combined, &transport);
        publisher.publish(PublisherKey::Combined, stamp_now(), &image_points(), &[]);

        let topics: Vec<_> = transport.published().into_iter().map(|(t, _)| t).collect();
        assert_eq!(topics, vec!["cepton_image_points", "cepton_points"]);
    }

    #[test]
    fn test_one_failure_does_not_block_other() {
        let transport = MemoryTransport::new();
        let publisher = publisher(AddressingPolicy::Combined, &transport);
        transport.fail_publish("cepton_image_points");

        let outcome = publisher.publish(PublisherKey::Combined, stamp_now(), &image_points(), &[]);
        assert_eq!(outcome, PublishOutcome { published: 1, failed: 1 });
        assert_eq!(transport.messages_on("cepton_points").len(), 1);

        let metrics = publisher.metrics();
        let image = metrics.iter().find(|(t, _)| t == "cepton_image_points").unwrap();
        assert_eq!(image.1.failure_count, 1);
    }

    #[test]
    fn test_prewarm_advertises_both_combined_topics() {
        let transport = MemoryTransport::new();
        publisher(AddressingPolicy::Combined, &transport).prewarm().unwrap();
        assert_eq!(
            transport.advertised(),
            vec![
                ("cepton_image_points".to_string(), 2),
                ("cepton_points".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_stamp_now_is_recent() {
        let stamp = stamp_now();
        assert!(stamp.sec > 1_600_000_000);
        assert!(stamp.nanosec < 1_000_000_000);
    }
}
