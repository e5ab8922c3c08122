//! Common types shared across device implementations.

use serde::{Deserialize, Serialize};

/// Generic device information.
///
/// Contains metadata about a hardware device such as name, model and the
/// pin(s) it is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Gate", "Keypad").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// GPIO pins the device is attached to, if known.
    pub pins: Vec<u8>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            pins: Vec::new(),
        }
    }

    /// Set the pins the device is wired to.
    pub fn with_pins(mut self, pins: impl Into<Vec<u8>>) -> Self {
        self.pins = pins.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("Gate", "SG90").with_pins([16]);
        assert_eq!(info.name, "Gate");
        assert_eq!(info.model, "SG90");
        assert_eq!(info.pins, vec![16]);
    }

    #[test]
    fn test_device_info_serialization() {
        let info = DeviceInfo::new("Keypad", "4x4 matrix").with_pins([2, 3, 4, 5]);
        let json = serde_json::to_string(&info).unwrap();
        let back: DeviceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, back);
    }
}
