//! Peripheral abstraction layer for the keygate access controller.
//!
//! This crate defines the small synchronous device interfaces the gate
//! controller talks to from inside state-engine hooks: a matrix keypad, a
//! hobby servo driving the gate arm, a character LCD, and raw digital inputs
//! used for push buttons.
//!
//! # Design Philosophy
//!
//! - **Non-blocking**: hooks run on the engine's tick thread, so every call
//!   returns immediately. [`Keypad::scan_key`] reports `Ok(None)` when no key
//!   is pending instead of waiting for one.
//! - **Object-safe**: all traits can be boxed (`Box<dyn Keypad>`), which is how
//!   the controller and the engine store them.
//! - **Send**: devices may be constructed on one thread and moved to the
//!   thread that runs the engine.
//! - **Error-aware**: every operation returns [`Result<T>`] with a
//!   [`HardwareError`] describing the failure.
//!
//! # Example
//!
//! ```
//! use keygate_hardware::mock::MockKeypad;
//! use keygate_hardware::{Key, Keypad};
//!
//! let (mut keypad, handle) = MockKeypad::new();
//! handle.send_key(Key::Digit(7)).unwrap();
//!
//! assert_eq!(keypad.scan_key().unwrap(), Some(Key::Digit(7)));
//! assert_eq!(keypad.scan_key().unwrap(), None);
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides simulated devices, each paired with a
//! cloneable handle that tests (or the CLI) use to inject input or inspect
//! output while the device itself is owned by the controller.

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{DigitalInput, Display, Key, Keypad, Servo};
pub use types::DeviceInfo;
