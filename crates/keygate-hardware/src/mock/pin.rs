//! Mock digital input pin.
//!
//! Models an active-low push button with pull-up: the pin reads high while
//! released and low while pressed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Result, traits::DigitalInput};

#[derive(Debug)]
pub struct MockPin {
    pin: u8,
    level: Arc<AtomicBool>,
    faulted: Arc<AtomicBool>,
}

impl MockPin {
    /// Create a pin that starts high (button released).
    pub fn new(pin: u8) -> (Self, MockPinHandle) {
        let level = Arc::new(AtomicBool::new(true));
        let faulted = Arc::new(AtomicBool::new(false));
        let handle = MockPinHandle {
            level: Arc::clone(&level),
            faulted: Arc::clone(&faulted),
        };
        (
            Self {
                pin,
                level,
                faulted,
            },
            handle,
        )
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl DigitalInput for MockPin {
    fn is_high(&mut self) -> Result<bool> {
        if self.faulted.load(Ordering::Acquire) {
            return Err(crate::HardwareError::bus(format!(
                "GPIO{} read failed",
                self.pin
            )));
        }
        Ok(self.level.load(Ordering::Acquire))
    }
}

/// Drives the level of a mock pin.
#[derive(Debug, Clone)]
pub struct MockPinHandle {
    level: Arc<AtomicBool>,
    faulted: Arc<AtomicBool>,
}

impl MockPinHandle {
    pub fn set_high(&self, high: bool) {
        self.level.store(high, Ordering::Release);
    }

    /// Pull the pin low.
    pub fn press(&self) {
        self.set_high(false);
    }

    /// Let the pull-up bring the pin high.
    pub fn release(&self) {
        self.set_high(true);
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    /// Make subsequent reads fail until cleared.
    pub fn set_faulted(&self, faulted: bool) {
        self.faulted.store(faulted, Ordering::Release);
    }
}
