//! Frame assembly and coordinate conversion

use std::sync::Arc;

use contracts::{CartesianPoint, ImagePoint, SensorHandle, SensorInformation, SensorSdk, Time};
use publisher::stamp_now;

use crate::error::{BridgeError, Result};

/// One sensor's batch from one SDK callback
///
/// Owns its points; the SDK's slice is only valid during the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub info: SensorInformation,
    /// Batch arrival time
    pub stamp: Time,
    pub points: Vec<ImagePoint>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Builds frames from raw callback data
pub struct FrameAssembler {
    sdk: Arc<dyn SensorSdk>,
}

impl FrameAssembler {
    pub fn new(sdk: Arc<dyn SensorSdk>) -> Self {
        Self { sdk }
    }

    /// Look up the sensor and copy the batch.
    ///
    /// # Errors
    /// `SensorInfoLookupFailed` when the SDK does not know `handle`.
    pub fn assemble(&self, handle: SensorHandle, points: &[ImagePoint]) -> Result<Frame> {
        let info = self
            .sdk
            .sensor_information(handle)
            .map_err(|code| BridgeError::SensorInfoLookupFailed { handle, code })?;

        Ok(Frame {
            info,
            stamp: stamp_now(),
            points: points.to_vec(),
        })
    }
}

/// Projects image-space points through the SDK
pub struct CoordinateConverter {
    sdk: Arc<dyn SensorSdk>,
}

impl CoordinateConverter {
    pub fn new(sdk: Arc<dyn SensorSdk>) -> Self {
        Self { sdk }
    }

    /// Cartesian points for every point with a return, in input order
    pub fn convert(&self, points: &[ImagePoint]) -> Vec<CartesianPoint> {
        points
            .iter()
            .filter(|p| p.has_return())
            .map(|p| self.sdk.convert_image_point(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SdkErrorCode, SdkEvent, SdkOptions, SerialNumber};
    use sensor_sdk::{MockSdk, MockSdkConfig};

    fn ignore_event(_: &SdkEvent<'_>) {}

    fn sdk() -> Arc<MockSdk> {
        let sdk = Arc::new(MockSdk::with_config(MockSdkConfig {
            emit_on_listen: false,
            ..Default::default()
        }));
        sdk.initialize(&SdkOptions::default(), ignore_event).unwrap();
        sdk
    }

    fn point(timestamp: i64, distance: f32) -> ImagePoint {
        ImagePoint {
            timestamp,
            image_x: 0.1,
            distance,
            image_z: -0.2,
            intensity: 0.7,
            return_number: 0,
            valid: distance != 0.0,
        }
    }

    #[test]
    fn test_assemble_copies_batch() {
        let sdk = sdk();
        let handle = sdk.add_sensor(SerialNumber(1001), "SIM");
        let assembler = FrameAssembler::new(sdk.clone());

        let points = vec![point(1, 1.0), point(2, 0.0)];
        let frame = assembler.assemble(handle, &points).unwrap();

        assert_eq!(frame.info.serial_number, SerialNumber(1001));
        assert_eq!(frame.points, points);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_assemble_unknown_handle() {
        let assembler = FrameAssembler::new(sdk());
        let err = assembler
            .assemble(SensorHandle(0xbad), &[point(1, 1.0)])
            .unwrap_err();
        assert_eq!(err.code(), Some(SdkErrorCode::ERROR_SENSOR_NOT_FOUND));
    }

    #[test]
    fn test_convert_skips_zero_distance() {
        let converter = CoordinateConverter::new(sdk());
        let points = vec![point(1, 2.0), point(2, 0.0), point(3, 4.0), point(4, 0.0)];

        let cartesian = converter.convert(&points);
        assert_eq!(cartesian.len(), 2);
        assert_eq!(cartesian[0].timestamp, 1);
        assert_eq!(cartesian[1].timestamp, 3);
    }

    #[test]
    fn test_convert_projection() {
        let converter = CoordinateConverter::new(sdk());
        let p = point(9, 3.0);

        let c = converter.convert(&[p])[0];
        let h = (0.1f32 * 0.1 + 0.2 * 0.2 + 1.0).sqrt();
        let r = 3.0 / h;
        assert!((c.x - (-0.1 * r)).abs() < 1e-5);
        assert!((c.y - r).abs() < 1e-5);
        assert!((c.z - (0.2 * r)).abs() < 1e-5);
        assert_eq!(c.intensity, p.intensity);
        assert!(c.valid);
    }

    #[test]
    fn test_convert_empty() {
        let converter = CoordinateConverter::new(sdk());
        assert!(converter.convert(&[]).is_empty());
        assert!(converter.convert(&[point(1, 0.0)]).is_empty());
    }
}
