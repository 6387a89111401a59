//! # Publisher
//!
//! Outbound side of the bridge.
//!
//! Responsibilities:
//! - Addressing policy and topic / frame-id naming
//! - Lazily created, cached channels per publisher key
//! - Publishing point clouds and sensor metadata
//! - Log / file / memory transports

pub mod addressing;
pub mod error;
pub mod frame_publisher;
pub mod info_reporter;
pub mod metrics;
pub mod registry;
pub mod transports;

pub use addressing::{AddressingPolicy, PublisherKey, TopicNaming};
pub use error::{PublisherError, Result};
pub use frame_publisher::{stamp_now, FramePublisher, PublishOutcome};
pub use info_reporter::SensorInfoReporter;
pub use metrics::{ChannelMetrics, MeteredChannel, MetricsSnapshot};
pub use registry::PublisherRegistry;
pub use transports::{
    create_transport, read_messages, FileFormat, FileTransport, LogTransport, MemoryTransport,
};
