//! SensorSdk trait - vendor SDK boundary
//!
//! The SDK exposes exactly one global registration slot per callback kind and
//! accepts bare function pointers only. Callbacks therefore carry no bound
//! context; recovering object context is the caller's job.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CartesianPoint, ImagePoint, SensorHandle, SensorInformation};

/// Integer status code returned by every SDK call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SdkErrorCode(pub i32);

impl SdkErrorCode {
    pub const SUCCESS: Self = Self(0);
    pub const ERROR_GENERIC: Self = Self(-1);
    pub const ERROR_OUT_OF_MEMORY: Self = Self(-2);
    pub const ERROR_SENSOR_NOT_FOUND: Self = Self(-4);
    pub const ERROR_SDK_VERSION_MISMATCH: Self = Self(-5);
    pub const ERROR_COMMUNICATION: Self = Self(-6);
    pub const ERROR_TOO_MANY_CALLBACKS: Self = Self(-7);
    pub const ERROR_INVALID_ARGUMENTS: Self = Self(-8);
    pub const ERROR_ALREADY_INITIALIZED: Self = Self(-9);
    pub const ERROR_NOT_INITIALIZED: Self = Self(-10);
    pub const ERROR_INVALID_FILE_TYPE: Self = Self(-11);
    pub const ERROR_FILE_IO: Self = Self(-12);
    pub const ERROR_CORRUPT_FILE: Self = Self(-13);
    pub const ERROR_NOT_OPEN: Self = Self(-14);
    pub const ERROR_EOF: Self = Self(-15);
    pub const FAULT_INTERNAL: Self = Self(-1000);
    pub const FAULT_EXTREME_TEMPERATURE: Self = Self(-1001);
    pub const FAULT_EXTREME_HUMIDITY: Self = Self(-1002);
    pub const FAULT_EXTREME_ACCELERATION: Self = Self(-1003);
    pub const FAULT_ABNORMAL_FOV: Self = Self(-1004);
    pub const FAULT_ABNORMAL_FRAME_RATE: Self = Self(-1005);
    pub const FAULT_MOTOR_MALFUNCTION: Self = Self(-1006);
    pub const FAULT_LASER_MALFUNCTION: Self = Self(-1007);
    pub const FAULT_DETECTOR_MALFUNCTION: Self = Self(-1008);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Faults are sensor-side conditions rather than API misuse.
    pub fn is_fault(self) -> bool {
        self.0 <= Self::FAULT_INTERNAL.0
    }

    /// Decoded vendor name
    pub fn name(self) -> &'static str {
        match self {
            Self::SUCCESS => "SUCCESS",
            Self::ERROR_GENERIC => "ERROR_GENERIC",
            Self::ERROR_OUT_OF_MEMORY => "ERROR_OUT_OF_MEMORY",
            Self::ERROR_SENSOR_NOT_FOUND => "ERROR_SENSOR_NOT_FOUND",
            Self::ERROR_SDK_VERSION_MISMATCH => "ERROR_SDK_VERSION_MISMATCH",
            Self::ERROR_COMMUNICATION => "ERROR_COMMUNICATION",
            Self::ERROR_TOO_MANY_CALLBACKS => "ERROR_TOO_MANY_CALLBACKS",
            Self::ERROR_INVALID_ARGUMENTS => "ERROR_INVALID_ARGUMENTS",
            Self::ERROR_ALREADY_INITIALIZED => "ERROR_ALREADY_INITIALIZED",
            Self::ERROR_NOT_INITIALIZED => "ERROR_NOT_INITIALIZED",
            Self::ERROR_INVALID_FILE_TYPE => "ERROR_INVALID_FILE_TYPE",
            Self::ERROR_FILE_IO => "ERROR_FILE_IO",
            Self::ERROR_CORRUPT_FILE => "ERROR_CORRUPT_FILE",
            Self::ERROR_NOT_OPEN => "ERROR_NOT_OPEN",
            Self::ERROR_EOF => "ERROR_EOF",
            Self::FAULT_INTERNAL => "FAULT_INTERNAL",
            Self::FAULT_EXTREME_TEMPERATURE => "FAULT_EXTREME_TEMPERATURE",
            Self::FAULT_EXTREME_HUMIDITY => "FAULT_EXTREME_HUMIDITY",
            Self::FAULT_EXTREME_ACCELERATION => "FAULT_EXTREME_ACCELERATION",
            Self::FAULT_ABNORMAL_FOV => "FAULT_ABNORMAL_FOV",
            Self::FAULT_ABNORMAL_FRAME_RATE => "FAULT_ABNORMAL_FRAME_RATE",
            Self::FAULT_MOTOR_MALFUNCTION => "FAULT_MOTOR_MALFUNCTION",
            Self::FAULT_LASER_MALFUNCTION => "FAULT_LASER_MALFUNCTION",
            Self::FAULT_DETECTOR_MALFUNCTION => "FAULT_DETECTOR_MALFUNCTION",
            _ => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for SdkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Result alias for raw SDK calls
pub type SdkResult<T> = std::result::Result<T, SdkErrorCode>;

/// Runtime event delivered through the event slot.
///
/// Borrowed fields are valid only for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct SdkEvent<'a> {
    pub handle: SensorHandle,
    pub code: SdkErrorCode,
    pub message: &'a str,
    pub data: &'a [u8],
}

/// Point slot signature. `points` is valid only during the call.
pub type PointsCallback = fn(SensorHandle, &[ImagePoint]);

/// Event slot signature.
pub type EventCallback = fn(&SdkEvent<'_>);

/// How the SDK slices the point stream into batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMode {
    /// One batch per full coverage of the field of view
    #[default]
    Cover,
    /// One batch per scan cycle
    Cycle,
    /// Fixed-length batches
    Timed,
    /// Every packet as its own batch
    Streaming,
}

/// Options handed to [`SensorSdk::initialize`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdkOptions {
    /// Vendor control-flags bitmask (passed through verbatim)
    pub control_flags: u32,
    pub frame_mode: FrameMode,
}

/// Vendor SDK boundary
///
/// Models a C-style global API: a single registration per callback kind,
/// function-pointer callbacks, integer error codes. Implementations deliver
/// callbacks on threads they own.
pub trait SensorSdk: Send + Sync {
    /// Initialize the SDK and register the event slot
    fn initialize(&self, options: &SdkOptions, on_event: EventCallback) -> SdkResult<()>;

    /// Tear down, clearing every registered slot
    fn deinitialize(&self) -> SdkResult<()>;

    /// Register the image-frame slot
    fn listen_image_frames(&self, on_points: PointsCallback) -> SdkResult<()>;

    /// Clear the image-frame slot
    fn unlisten_image_frames(&self) -> SdkResult<()>;

    /// Latest metadata for a sensor seen in this session
    fn sensor_information(&self, handle: SensorHandle) -> SdkResult<SensorInformation>;

    /// Image-space to Cartesian projection
    fn convert_image_point(&self, point: &ImagePoint) -> CartesianPoint {
        point.to_cartesian()
    }

    /// Open a capture file for replay
    fn capture_replay_open(&self, path: &Path) -> SdkResult<()>;

    fn capture_replay_set_enable_loop(&self, enable: bool) -> SdkResult<()>;

    /// Start delivering frames from the open capture
    fn capture_replay_resume(&self) -> SdkResult<()>;
}
