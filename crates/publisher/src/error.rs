//! Publisher error types

use contracts::ContractError;
use thiserror::Error;

/// Publisher-specific errors
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Transport could not be built from configuration
    #[error("failed to create transport '{transport}': {message}")]
    TransportCreation { transport: String, message: String },

    /// Channel could not be advertised
    #[error("failed to create channel '{topic}': {source}")]
    ChannelCreation {
        topic: String,
        #[source]
        source: ContractError,
    },

    /// Channel rejected a message
    #[error("failed to publish on '{topic}': {source}")]
    Publish {
        topic: String,
        #[source]
        source: ContractError,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublisherError {
    /// Create a transport creation error
    pub fn transport_creation(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create a channel creation error
    pub fn channel_creation(topic: impl Into<String>, source: ContractError) -> Self {
        Self::ChannelCreation {
            topic: topic.into(),
            source,
        }
    }

    /// Create a publish error
    pub fn publish(topic: impl Into<String>, source: ContractError) -> Self {
        Self::Publish {
            topic: topic.into(),
            source,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, PublisherError>;
