//! Bridge error types

use contracts::{SdkErrorCode, SensorHandle};
use driver::DriverError;
use publisher::PublisherError;
use thiserror::Error;

/// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Metadata lookup for a batch failed; the batch is dropped
    #[error("sensor information lookup for {handle} failed: {code}")]
    SensorInfoLookupFailed {
        handle: SensorHandle,
        code: SdkErrorCode,
    },

    /// Runtime event reported by the SDK
    #[error("SDK event from {handle}: {code}: {message}")]
    SdkRuntimeEvent {
        handle: SensorHandle,
        code: SdkErrorCode,
        message: String,
    },

    /// Driver lifecycle / startup error
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Channel creation / publish error
    #[error(transparent)]
    Publisher(#[from] PublisherError),
}

impl BridgeError {
    /// SDK status code carried by the error, if any
    pub fn code(&self) -> Option<SdkErrorCode> {
        match self {
            Self::SensorInfoLookupFailed { code, .. } | Self::SdkRuntimeEvent { code, .. } => {
                Some(*code)
            }
            Self::Driver(e) => e.code(),
            Self::Publisher(_) => None,
        }
    }
}

/// Bridge Result alias
pub type Result<T> = std::result::Result<T, BridgeError>;
