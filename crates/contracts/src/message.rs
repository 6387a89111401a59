//! Outbound message shapes
//!
//! The host middleware carries three kinds of messages:
//! - sensor metadata ([`SensorInformation`])
//! - image-space point clouds
//! - Cartesian point clouds
//!
//! Point clouds use the host's packed layout: a field table plus a flat
//! little-endian byte buffer, `height` rows of `width` points.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{CartesianPoint, ContractError, ImagePoint, SensorInformation};

/// Message stamp (seconds + nanoseconds since the Unix epoch)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Time {
    pub sec: i64,
    pub nanosec: u32,
}

impl Time {
    /// Build from nanoseconds since the Unix epoch.
    pub fn from_nanos(nanos: i64) -> Self {
        Self {
            sec: nanos.div_euclid(1_000_000_000),
            nanosec: nanos.rem_euclid(1_000_000_000) as u32,
        }
    }

    /// Total nanoseconds since the Unix epoch.
    pub fn as_nanos(&self) -> i64 {
        self.sec * 1_000_000_000 + self.nanosec as i64
    }
}

/// Message header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Time,
    /// Coordinate frame label
    pub frame_id: String,
}

/// Field data type codes understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointFieldType {
    Int8 = 1,
    Uint8 = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Float32 = 7,
    Float64 = 8,
}

/// One entry of a point cloud's field table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointField {
    pub name: String,
    pub offset: u32,
    pub datatype: u8,
    pub count: u32,
}

impl PointField {
    fn new(name: &str, offset: u32, datatype: PointFieldType) -> Self {
        Self {
            name: name.to_string(),
            offset,
            datatype: datatype as u8,
            count: 1,
        }
    }
}

/// A point type that can be packed into a [`PointCloud`].
pub trait PointRecord: Sized {
    /// Bytes per point, padding included
    const POINT_STEP: u32;

    /// Field table describing the packed layout
    fn fields() -> Vec<PointField>;

    /// Append exactly `POINT_STEP` bytes.
    fn encode(&self, buf: &mut BytesMut);

    /// Read one point from exactly `POINT_STEP` bytes.
    fn decode(buf: &[u8]) -> Self;
}

// Timestamps are packed as FLOAT64 microseconds; exact below 2^53 us.
impl PointRecord for ImagePoint {
    const POINT_STEP: u32 = 32;

    fn fields() -> Vec<PointField> {
        vec![
            PointField::new("timestamp", 0, PointFieldType::Float64),
            PointField::new("image_x", 8, PointFieldType::Float32),
            PointField::new("distance", 12, PointFieldType::Float32),
            PointField::new("image_z", 16, PointFieldType::Float32),
            PointField::new("intensity", 20, PointFieldType::Float32),
            PointField::new("return_number", 24, PointFieldType::Uint8),
            PointField::new("valid", 25, PointFieldType::Uint8),
        ]
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_f64_le(self.timestamp as f64);
        buf.put_f32_le(self.image_x);
        buf.put_f32_le(self.distance);
        buf.put_f32_le(self.image_z);
        buf.put_f32_le(self.intensity);
        buf.put_u8(self.return_number);
        buf.put_u8(self.valid as u8);
        buf.put_bytes(0, 6);
    }

    fn decode(mut buf: &[u8]) -> Self {
        Self {
            timestamp: buf.get_f64_le() as i64,
            image_x: buf.get_f32_le(),
            distance: buf.get_f32_le(),
            image_z: buf.get_f32_le(),
            intensity: buf.get_f32_le(),
            return_number: buf.get_u8(),
            valid: buf.get_u8() != 0,
        }
    }
}

impl PointRecord for CartesianPoint {
    const POINT_STEP: u32 = 32;

    fn fields() -> Vec<PointField> {
        vec![
            PointField::new("timestamp", 0, PointFieldType::Float64),
            PointField::new("x", 8, PointFieldType::Float32),
            PointField::new("y", 12, PointFieldType::Float32),
            PointField::new("z", 16, PointFieldType::Float32),
            PointField::new("intensity", 20, PointFieldType::Float32),
            PointField::new("return_number", 24, PointFieldType::Uint8),
            PointField::new("valid", 25, PointFieldType::Uint8),
        ]
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_f64_le(self.timestamp as f64);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
        buf.put_f32_le(self.intensity);
        buf.put_u8(self.return_number);
        buf.put_u8(self.valid as u8);
        buf.put_bytes(0, 6);
    }

    fn decode(mut buf: &[u8]) -> Self {
        Self {
            timestamp: buf.get_f64_le() as i64,
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            z: buf.get_f32_le(),
            intensity: buf.get_f32_le(),
            return_number: buf.get_u8(),
            valid: buf.get_u8() != 0,
        }
    }
}

/// Packed point cloud in the host's layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub fields: Vec<PointField>,
    pub is_bigendian: bool,
    pub point_step: u32,
    pub row_step: u32,
    pub data: Bytes,
    pub is_dense: bool,
}

impl PointCloud {
    /// Pack `points` as a single row.
    pub fn from_points<P: PointRecord>(header: Header, points: &[P]) -> Self {
        let mut data = BytesMut::with_capacity(points.len() * P::POINT_STEP as usize);
        for point in points {
            point.encode(&mut data);
        }

        let width = points.len() as u32;
        Self {
            header,
            height: 1,
            width,
            fields: P::fields(),
            is_bigendian: false,
            point_step: P::POINT_STEP,
            row_step: P::POINT_STEP * width,
            data: data.freeze(),
            is_dense: true,
        }
    }

    /// Number of points carried
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unpack into typed points.
    ///
    /// # Errors
    /// Layout does not match `P` or the buffer is truncated.
    pub fn decode_points<P: PointRecord>(&self) -> Result<Vec<P>, ContractError> {
        if self.point_step != P::POINT_STEP || self.fields != P::fields() {
            return Err(ContractError::payload_decode(
                &self.header.frame_id,
                "field layout does not match requested point type",
            ));
        }
        let expected = self.len().checked_mul(self.point_step as usize);
        if expected != Some(self.data.len()) {
            return Err(ContractError::payload_decode(
                &self.header.frame_id,
                format!(
                    "{}x{} points of {} bytes do not match {} data bytes",
                    self.width,
                    self.height,
                    self.point_step,
                    self.data.len()
                ),
            ));
        }

        Ok(self
            .data
            .chunks_exact(self.point_step as usize)
            .map(P::decode)
            .collect())
    }
}

/// Message kinds, one channel family each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    SensorInformation,
    ImagePoints,
    Points,
}

impl MessageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageKind::SensorInformation => "sensor_information",
            MessageKind::ImagePoints => "image_points",
            MessageKind::Points => "points",
        }
    }
}

/// Anything a channel can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    SensorInformation(SensorInformation),
    PointCloud(PointCloud),
}

impl Message {
    /// Frame label, if the message carries one
    pub fn frame_id(&self) -> Option<&str> {
        match self {
            Message::SensorInformation(_) => None,
            Message::PointCloud(cloud) => Some(&cloud.header.frame_id),
        }
    }

    pub fn as_point_cloud(&self) -> Option<&PointCloud> {
        match self {
            Message::PointCloud(cloud) => Some(cloud),
            Message::SensorInformation(_) => None,
        }
    }

    pub fn as_sensor_information(&self) -> Option<&SensorInformation> {
        match self {
            Message::SensorInformation(info) => Some(info),
            Message::PointCloud(_) => None,
        }
    }
}
