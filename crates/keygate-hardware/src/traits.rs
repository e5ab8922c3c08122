//! Peripheral trait definitions.
//!
//! These traits are the contract between the gate controller and its
//! devices. All methods are synchronous and must return promptly because
//! they are called from state-engine hooks on the tick thread.

use crate::error::{HardwareError, Result};
use crate::types::DeviceInfo;
use std::fmt;

/// A key on a 4x4 matrix keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Key {
    /// Numeric key 0-9.
    Digit(u8),

    /// Star key (`*`).
    Star,

    /// Hash key (`#`).
    Hash,

    /// Letter key `A`-`D` in the rightmost column.
    Letter(char),
}

impl Key {
    /// Create a digit key with validation.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` if `d` is greater than 9.
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a keypad legend character to a key.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` for characters not printed on the
    /// keypad.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Ok(Self::Digit(c as u8 - b'0')),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            'A'..='D' => Ok(Self::Letter(c)),
            'a'..='d' => Ok(Self::Letter(c.to_ascii_uppercase())),
            other => Err(HardwareError::invalid_data(format!(
                "Unknown key '{}'",
                other
            ))),
        }
    }

    /// Check if this is a digit key.
    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }

    /// Get the digit value, if this is a digit key.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }

    /// The legend printed on the key.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Star => '*',
            Self::Hash => '#',
            Self::Letter(c) => *c,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Matrix keypad.
pub trait Keypad: Send {
    /// Scan for a pressed key without waiting.
    ///
    /// Returns `Ok(None)` when no key is pending.
    fn scan_key(&mut self) -> Result<Option<Key>>;

    fn info(&self) -> DeviceInfo;
}

/// Positional servo driving the gate arm.
pub trait Servo: Send {
    /// Move to `degrees` (0-180).
    fn set_angle(&mut self, degrees: u16) -> Result<()>;

    /// Last commanded angle, `None` before the first move.
    fn angle(&self) -> Option<u16>;

    fn info(&self) -> DeviceInfo;
}

/// Character display.
pub trait Display: Send {
    /// Blank every line.
    fn clear(&mut self) -> Result<()>;

    /// Write `text` on `line`, replacing what was there.
    fn show_text(&mut self, text: &str, line: usize) -> Result<()>;

    fn info(&self) -> DeviceInfo;
}

/// Raw digital input pin (push button, reed switch...).
///
/// Inputs are wired active-low with a pull-up: `true` means released.
pub trait DigitalInput: Send {
    fn is_high(&mut self) -> Result<bool>;
}

impl<T: Keypad + ?Sized> Keypad for Box<T> {
    fn scan_key(&mut self) -> Result<Option<Key>> {
        (**self).scan_key()
    }

    fn info(&self) -> DeviceInfo {
        (**self).info()
    }
}

impl<T: Servo + ?Sized> Servo for Box<T> {
    fn set_angle(&mut self, degrees: u16) -> Result<()> {
        (**self).set_angle(degrees)
    }

    fn angle(&self) -> Option<u16> {
        (**self).angle()
    }

    fn info(&self) -> DeviceInfo {
        (**self).info()
    }
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn show_text(&mut self, text: &str, line: usize) -> Result<()> {
        (**self).show_text(text, line)
    }

    fn info(&self) -> DeviceInfo {
        (**self).info()
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_high(&mut self) -> Result<bool> {
        (**self).is_high()
    }
}
