//! Addressing policy and topic naming
//!
//! The policy is chosen once at startup. It decides whether sensors share one
//! set of channels or get a set each, and how topics and frame labels are named.

use std::fmt;

use contracts::{MessageKind, SerialNumber};

/// Queue depth of the metadata channel
pub const METADATA_QUEUE_SIZE: usize = 2;
/// Queue depth of shared point channels
pub const COMBINED_QUEUE_SIZE: usize = 2;
/// Queue depth of per-sensor point channels
pub const PER_SENSOR_QUEUE_SIZE: usize = 10;

/// Default topic and frame prefix
pub const DEFAULT_NAMESPACE: &str = "cepton";

/// How batches map to channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressingPolicy {
    /// Every sensor publishes on one shared set of channels
    Combined,
    /// One set of channels per serial number
    #[default]
    PerSensor,
}

impl AddressingPolicy {
    pub fn from_combine_flag(combine_sensors: bool) -> Self {
        if combine_sensors {
            Self::Combined
        } else {
            Self::PerSensor
        }
    }
}

/// Registry lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublisherKey {
    Sensor(SerialNumber),
    Combined,
}

impl fmt::Display for PublisherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(serial) => write!(f, "sensor:{serial}"),
            Self::Combined => f.write_str("combined"),
        }
    }
}

/// Topic and frame-id naming under one namespace and policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNaming {
    namespace: String,
    policy: AddressingPolicy,
}

impl TopicNaming {
    pub fn new(namespace: impl Into<String>, policy: AddressingPolicy) -> Self {
        Self {
            namespace: namespace.into(),
            policy,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn policy(&self) -> AddressingPolicy {
        self.policy
    }

    /// Key a batch from `serial_number` is published under
    pub fn key_for(&self, serial_number: SerialNumber) -> PublisherKey {
        match self.policy {
            AddressingPolicy::Combined => PublisherKey::Combined,
            AddressingPolicy::PerSensor => PublisherKey::Sensor(serial_number),
        }
    }

    /// Topic for a message kind and key.
    ///
    /// Metadata always goes to the single namespace-wide topic.
    pub fn topic(&self, kind: MessageKind, key: PublisherKey) -> String {
        match (kind, key) {
            (MessageKind::SensorInformation, _) => self.metadata_topic(),
            (_, PublisherKey::Combined) => format!("{}_{}", self.namespace, kind.as_str()),
            (_, PublisherKey::Sensor(serial)) => {
                format!("{}_{}_{}", self.namespace, kind.as_str(), serial)
            }
        }
    }

    pub fn metadata_topic(&self) -> String {
        format!(
            "{}_{}",
            self.namespace,
            MessageKind::SensorInformation.as_str()
        )
    }

    /// Frame label stamped on point clouds published under `key`
    pub fn frame_id(&self, key: PublisherKey) -> String {
        match key {
            PublisherKey::Combined => self.namespace.clone(),
            PublisherKey::Sensor(serial) => format!("{}_{}", self.namespace, serial),
        }
    }

    /// Transport queue depth for a channel
    pub fn queue_size(&self, kind: MessageKind, key: PublisherKey) -> usize {
        match (kind, key) {
            (MessageKind::SensorInformation, _) => METADATA_QUEUE_SIZE,
            (_, PublisherKey::Combined) => COMBINED_QUEUE_SIZE,
            (_, PublisherKey::Sensor(_)) => PER_SENSOR_QUEUE_SIZE,
        }
    }
}

impl Default for TopicNaming {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, AddressingPolicy::default())
    }
}
