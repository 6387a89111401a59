//! LogTransport - logs a summary of every message via tracing

use std::sync::Arc;

use contracts::{Channel, ContractError, Message, Transport};
use tracing::{debug, info};

/// Transport that logs message summaries for debugging
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new("log")
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn advertise(&self, topic: &str, queue_size: usize) -> Result<Arc<dyn Channel>, ContractError> {
        info!(transport = %self.name, topic, queue_size, "channel advertised");
        Ok(Arc::new(LogChannel {
            topic: topic.to_string(),
        }))
    }
}

struct LogChannel {
    topic: String,
}

impl Channel for LogChannel {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, message: Message) -> Result<(), ContractError> {
        match &message {
            Message::SensorInformation(info) => debug!(
                topic = %self.topic,
                serial_number = %info.serial_number,
                model_name = %info.model_name,
                "sensor information"
            ),
            Message::PointCloud(cloud) => debug!(
                topic = %self.topic,
                frame_id = %cloud.header.frame_id,
                stamp_sec = cloud.header.stamp.sec,
                width = cloud.width,
                bytes = cloud.data.len(),
                "point cloud"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Header, ImagePoint, PointCloud};

    #[test]
    fn test_log_transport_publish() {
        let transport = LogTransport::new("test_log");
        assert_eq!(transport.name(), "test_log");

        let channel = transport.advertise("cepton_points_1", 10).unwrap();
        assert_eq!(channel.topic(), "cepton_points_1");

        let cloud = PointCloud::from_points(Header::default(), &[ImagePoint::default()]);
        assert!(channel.publish(Message::PointCloud(cloud)).is_ok());
    }
}
