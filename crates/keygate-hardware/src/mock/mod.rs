//! Mock device implementations for testing and development.
//!
//! Each device is returned together with a cloneable handle. The device is
//! moved into the controller; the handle stays with the test or the CLI to
//! inject input and observe output.

pub mod display;
pub mod keypad;
pub mod pin;
pub mod servo;

// Re-export commonly used types
pub use display::{Alignment, MockDisplay, MockDisplayHandle, align_text, truncate_text};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use pin::{MockPin, MockPinHandle};
pub use servo::{MockServo, MockServoHandle, ServoStatus};
