//! Driver error types

use contracts::{SdkErrorCode, SensorHandle};
use thiserror::Error;

/// Driver lifecycle and SDK startup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// `initialize` called while not Uninitialized
    #[error("driver already initialized")]
    AlreadyInitialized,

    /// `deinitialize` ran while `initialize` was registering
    #[error("driver initialize cancelled by deinitialize")]
    InitializeCancelled,

    /// Operation requires an Active driver
    #[error("driver not initialized")]
    NotInitialized,

    /// SDK initialization rejected
    #[error("SDK initialize failed: {0}")]
    SdkInitFailed(SdkErrorCode),

    /// Image-frame listener registration rejected
    #[error("SDK listen_image_frames failed: {0}")]
    SdkListenFailed(SdkErrorCode),

    /// One step of capture replay startup rejected
    #[error("SDK {call} failed: {code}")]
    SdkCaptureFailed {
        call: &'static str,
        code: SdkErrorCode,
    },

    /// Metadata lookup rejected
    #[error("sensor information lookup for {handle} failed: {code}")]
    SensorLookupFailed {
        handle: SensorHandle,
        code: SdkErrorCode,
    },
}

impl DriverError {
    /// Create capture replay error
    pub fn capture(call: &'static str, code: SdkErrorCode) -> Self {
        Self::SdkCaptureFailed { call, code }
    }

    /// SDK status code carried by the error, if any
    pub fn code(&self) -> Option<SdkErrorCode> {
        match self {
            Self::AlreadyInitialized | Self::InitializeCancelled | Self::NotInitialized => None,
            Self::SdkInitFailed(code) | Self::SdkListenFailed(code) => Some(*code),
            Self::SdkCaptureFailed { code, .. } | Self::SensorLookupFailed { code, .. } => {
                Some(*code)
            }
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DriverError>;
