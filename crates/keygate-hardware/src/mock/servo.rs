//! Mock servo implementation.
//!
//! The servo publishes its status on a `watch` channel so a handle can read
//! the current angle while the servo itself is owned by the controller.

use crate::{Result, traits::Servo, types::DeviceInfo};
use tokio::sync::watch;

/// Largest angle accepted by the simulated servo.
const MAX_ANGLE: u16 = 180;

/// Observable state of a mock servo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServoStatus {
    /// Last commanded angle.
    pub angle: Option<u16>,

    /// Number of successful `set_angle` calls.
    pub moves: usize,
}

/// Mock servo device.
///
/// # Examples
///
/// ```
/// use keygate_hardware::mock::MockServo;
/// use keygate_hardware::Servo;
///
/// let (mut servo, handle) = MockServo::new(16, "Gate");
/// servo.set_angle(90).unwrap();
///
/// assert_eq!(handle.angle(), Some(90));
/// ```
#[derive(Debug)]
pub struct MockServo {
    pin: u8,
    name: String,
    status_tx: watch::Sender<ServoStatus>,
}

impl MockServo {
    pub fn new(pin: u8, name: impl Into<String>) -> (Self, MockServoHandle) {
        let (status_tx, status_rx) = watch::channel(ServoStatus::default());
        let servo = Self {
            pin,
            name: name.into(),
            status_tx,
        };
        (servo, MockServoHandle { status_rx })
    }
}

impl Servo for MockServo {
    fn set_angle(&mut self, degrees: u16) -> Result<()> {
        if degrees > MAX_ANGLE {
            return Err(crate::HardwareError::out_of_range(
                "Servo angle",
                degrees as usize,
                MAX_ANGLE as usize,
            ));
        }
        self.status_tx.send_modify(|status| {
            status.angle = Some(degrees);
            status.moves += 1;
        });
        Ok(())
    }

    fn angle(&self) -> Option<u16> {
        self.status_tx.borrow().angle
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock Servo").with_pins([self.pin])
    }
}

/// Read-only view of a mock servo.
#[derive(Debug, Clone)]
pub struct MockServoHandle {
    status_rx: watch::Receiver<ServoStatus>,
}

impl MockServoHandle {
    pub fn angle(&self) -> Option<u16> {
        self.status_rx.borrow().angle
    }

    pub fn moves(&self) -> usize {
        self.status_rx.borrow().moves
    }

    pub fn status(&self) -> ServoStatus {
        self.status_rx.borrow().clone()
    }
}
