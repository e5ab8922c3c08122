//! Mock keypad implementation for testing and development.
//!
//! Keys are delivered through an internal channel, in the order they were
//! sent. [`Keypad::scan_key`] drains at most one key per call.

use crate::{
    Result,
    traits::{Key, Keypad},
    types::DeviceInfo,
};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

/// Keys buffered between the handle and the keypad.
const KEY_BUFFER: usize = 64;

/// Mock keypad device for testing and development.
///
/// # Examples
///
/// ```
/// use keygate_hardware::mock::MockKeypad;
/// use keygate_hardware::{Key, Keypad};
///
/// let (mut keypad, handle) = MockKeypad::new();
/// handle.send_text("12#").unwrap();
///
/// assert_eq!(keypad.scan_key().unwrap(), Some(Key::Digit(1)));
/// assert_eq!(keypad.scan_key().unwrap(), Some(Key::Digit(2)));
/// assert_eq!(keypad.scan_key().unwrap(), Some(Key::Hash));
/// assert_eq!(keypad.scan_key().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated key presses
    key_rx: mpsc::Receiver<Key>,

    /// Device name
    name: String,
}

impl MockKeypad {
    /// Create a new mock keypad with the default name.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let (key_tx, key_rx) = mpsc::channel(KEY_BUFFER);

        let keypad = Self {
            key_rx,
            name: name.clone(),
        };

        let handle = MockKeypadHandle { key_tx, name };

        (keypad, handle)
    }
}

impl Keypad for MockKeypad {
    fn scan_key(&mut self) -> Result<Option<Key>> {
        match self.key_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(crate::HardwareError::disconnected(
                format!("{} input channel closed", self.name),
            )),
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock 4x4 Keypad").with_pins([2, 3, 4, 5, 6, 7, 8, 9])
    }
}

/// Handle for pressing keys on a mock keypad.
///
/// Cloneable and `Send`; it may live on another thread than the keypad.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated key presses
    key_tx: mpsc::Sender<Key>,

    /// Device name
    name: String,
}

impl MockKeypadHandle {
    /// Press a key without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key buffer is full or the keypad was dropped.
    pub fn send_key(&self, key: Key) -> Result<()> {
        self.key_tx.try_send(key).map_err(|e| match e {
            TrySendError::Full(_) => crate::HardwareError::bus("Keypad buffer full"),
            TrySendError::Closed(_) => crate::HardwareError::disconnected(self.name.clone()),
        })
    }

    /// Press a key, waiting for buffer space.
    ///
    /// Intended for plain OS threads (e.g. a stdin reader). Must not be
    /// called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad was dropped.
    pub fn send_key_blocking(&self, key: Key) -> Result<()> {
        self.key_tx
            .blocking_send(key)
            .map_err(|_| crate::HardwareError::disconnected(self.name.clone()))
    }

    /// Press every key legend in `text`, skipping whitespace.
    ///
    /// # Errors
    ///
    /// Fails on the first character that is not on the keypad; keys before
    /// it have already been sent.
    pub fn send_text(&self, text: &str) -> Result<()> {
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            self.send_key(Key::from_char(c)?)?;
        }
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
