//! SensorInfoReporter - publishes sensor metadata snapshots

use std::sync::Arc;

use contracts::{Channel, Message, MessageKind, SensorInformation, Transport};
use tracing::{info, instrument};

use crate::addressing::{PublisherKey, TopicNaming};
use crate::error::{PublisherError, Result};
use crate::metrics::{MeteredChannel, MetricsSnapshot};

/// Owns the single metadata channel, advertised once at construction
pub struct SensorInfoReporter {
    channel: Arc<MeteredChannel>,
}

impl SensorInfoReporter {
    #[instrument(name = "info_reporter_new", skip_all, fields(namespace = naming.namespace()))]
    pub fn new(naming: &TopicNaming, transport: &dyn Transport) -> Result<Self> {
        let topic = naming.metadata_topic();
        let queue_size = naming.queue_size(MessageKind::SensorInformation, PublisherKey::Combined);
        let channel = transport
            .advertise(&topic, queue_size)
            .map_err(|e| PublisherError::channel_creation(&topic, e))?;

        info!(topic = %topic, "metadata channel ready");
        Ok(Self {
            channel: Arc::new(MeteredChannel::new(channel)),
        })
    }

    pub fn topic(&self) -> &str {
        self.channel.topic()
    }

    /// Publish the latest snapshot for one sensor
    pub fn report(&self, info: &SensorInformation) -> Result<()> {
        self.channel
            .publish(Message::SensorInformation(info.clone()))
            .map_err(|e| PublisherError::publish(self.topic(), e))
    }

    pub fn metrics(&self) -> (String, MetricsSnapshot) {
        (self.topic().to_string(), self.channel.metrics().snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::AddressingPolicy;
    use crate::transports::MemoryTransport;
    use contracts::{SensorHandle, SerialNumber};

    fn info() -> SensorInformation {
        SensorInformation {
            handle: SensorHandle(0x1000),
            serial_number: SerialNumber(1001),
            model_name: "Vista-P60".into(),
            model: 11,
            firmware_version: 120,
        }
    }

    #[test]
    fn test_advertised_once_and_reports() {
        let transport = MemoryTransport::new();
        let naming = TopicNaming::new("cepton", AddressingPolicy::PerSensor);
        let reporter = SensorInfoReporter::new(&naming, &transport).unwrap();

        reporter.report(&info()).unwrap();
        reporter.report(&info()).unwrap();

        assert_eq!(
            transport.advertised(),
            vec![("cepton_sensor_information".to_string(), 2)]
        );
        let messages = transport.messages_on("cepton_sensor_information");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].as_sensor_information(), Some(&info()));
        assert_eq!(reporter.metrics().1.publish_count, 2);
    }

    #[test]
    fn test_advertise_failure() {
        let transport = MemoryTransport::new();
        transport.fail_advertise("cepton_sensor_information");
        let naming = TopicNaming::default();
        assert!(SensorInfoReporter::new(&naming, &transport).is_err());
    }
}
