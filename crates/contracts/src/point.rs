//! Point and sensor metadata records
//!
//! Plain value types delivered by the SDK callbacks.

use serde::{Deserialize, Serialize};

use crate::{SensorHandle, SerialNumber};

/// Image-space return as delivered by the SDK.
///
/// `image_x` / `image_z` are tangent-plane coordinates; `distance == 0.0`
/// marks a direction with no return and is not a measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    /// Capture time (microseconds)
    pub timestamp: i64,
    pub image_x: f32,
    /// Range (meters); zero means "no return"
    pub distance: f32,
    pub image_z: f32,
    /// Normalized reflectivity
    pub intensity: f32,
    pub return_number: u8,
    pub valid: bool,
}

impl ImagePoint {
    /// True when the point carries range information.
    #[inline]
    pub fn has_return(&self) -> bool {
        self.distance != 0.0
    }

    /// Project onto the sensor's Cartesian frame.
    ///
    /// +y points out of the sensor, +x to the right, +z up.
    pub fn to_cartesian(&self) -> CartesianPoint {
        let hypotenuse = (self.image_x * self.image_x + self.image_z * self.image_z + 1.0).sqrt();
        let ratio = self.distance / hypotenuse;

        CartesianPoint {
            timestamp: self.timestamp,
            x: -self.image_x * ratio,
            y: ratio,
            z: -self.image_z * ratio,
            intensity: self.intensity,
            return_number: self.return_number,
            valid: self.valid,
        }
    }
}

/// Cartesian return (meters, sensor frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CartesianPoint {
    pub timestamp: i64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
    pub return_number: u8,
    pub valid: bool,
}

/// Metadata snapshot for one sensor.
///
/// Not versioned: every publish is the latest known state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorInformation {
    pub handle: SensorHandle,
    pub serial_number: SerialNumber,
    pub model_name: String,
    pub model: u16,
    pub firmware_version: u16,
}
