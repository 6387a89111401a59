//! Layered error definitions
//!
//! Categorized by source: config / payload / transport

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Point cloud payload does not match the requested layout
    #[error("payload decode error for frame '{frame_id}': {message}")]
    PayloadDecode { frame_id: String, message: String },

    // ===== Transport Errors =====
    /// Channel could not be advertised
    #[error("transport '{transport}' failed to advertise '{topic}': {message}")]
    Advertise {
        transport: String,
        topic: String,
        message: String,
    },

    /// Channel publish error
    #[error("publish on '{topic}' failed: {message}")]
    Publish { topic: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload decode error
    pub fn payload_decode(frame_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadDecode {
            frame_id: frame_id.into(),
            message: message.into(),
        }
    }

    /// Create advertise error
    pub fn advertise(
        transport: impl Into<String>,
        topic: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Advertise {
            transport: transport.into(),
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }
}
