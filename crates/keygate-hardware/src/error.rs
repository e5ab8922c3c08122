//! Peripheral errors.
//!
//! Failures here belong to the peripheral. The state engine never treats them
//! as its own faults: hooks decide whether to surface or ignore them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HardwareError {
    /// The other end of the device link is gone.
    #[error("{device} disconnected")]
    Disconnected { device: String },

    /// A read or write on the device bus failed.
    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("{what} {value} out of range (max {max})")]
    OutOfRange {
        what: &'static str,
        value: usize,
        max: usize,
    },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn out_of_range(what: &'static str, value: usize, max: usize) -> Self {
        Self::OutOfRange { what, value, max }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Bus(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HardwareError::disconnected("Keypad"), "Keypad disconnected")]
    #[case(HardwareError::bus("I2C NACK at 0x27"), "Bus error: I2C NACK at 0x27")]
    #[case(HardwareError::invalid_data("Unknown key 'x'"), "Invalid data: Unknown key 'x'")]
    #[case(
        HardwareError::out_of_range("Servo angle", 270, 180),
        "Servo angle 270 out of range (max 180)"
    )]
    fn test_messages(#[case] error: HardwareError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_only_bus_errors_are_transient() {
        assert!(HardwareError::bus("timeout").is_transient());
        assert!(!HardwareError::disconnected("Servo").is_transient());
        assert!(!HardwareError::out_of_range("Display line", 3, 1).is_transient());
    }
}
