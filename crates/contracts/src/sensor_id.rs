//! Sensor identifiers
//!
//! Two distinct identities flow through the bridge:
//! - [`SensorHandle`]: assigned by the SDK for one session, not stable
//! - [`SerialNumber`]: burned into the device, used for channel multiplexing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-scoped opaque handle assigned by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorHandle(pub u64);

impl SensorHandle {
    /// Raw value as handed out by the SDK.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SensorHandle {
    #[inline]
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Stable serial number of a physical sensor.
///
/// Used as the multiplexing key for output channels and in frame labels,
/// so `Display` prints the bare decimal value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SerialNumber(pub u64);

impl SerialNumber {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SerialNumber {
    #[inline]
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_serial_display_is_decimal() {
        assert_eq!(SerialNumber(1001).to_string(), "1001");
    }

    #[test]
    fn test_handle_display_is_hex() {
        assert_eq!(SensorHandle(255).to_string(), "0xff");
    }

    #[test]
    fn test_hashmap_key() {
        let mut map: HashMap<SerialNumber, i32> = HashMap::new();
        map.insert(1001.into(), 1);
        map.insert(1002.into(), 2);

        assert_eq!(map.get(&SerialNumber(1001)), Some(&1));
        assert_eq!(map.get(&SerialNumber(1002)), Some(&2));
    }

    #[test]
    fn test_serde_transparent() {
        let serial = SerialNumber(42);
        let json = serde_json::to_string(&serial).unwrap();
        assert_eq!(json, "42");

        let parsed: SerialNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serial);
    }
}
