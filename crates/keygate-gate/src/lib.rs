//! Keypad-operated gate built on the keygate state engine.
//!
//! [`GateController`] is the [`StateHandler`](keygate_engine::StateHandler)
//! for the seven-state access flow; [`build_engine`] registers its events,
//! timers and transitions.
//!
//! ```
//! use keygate_core::{AppConfig, GateConfig};
//! use keygate_gate::{GateController, GateState, build_engine};
//! use keygate_hardware::mock::{MockDisplay, MockKeypad, MockServo};
//!
//! let config = AppConfig::default();
//! let (keypad, _keys) = MockKeypad::new();
//! let (servo, servo_handle) = MockServo::new(16, "Gate");
//! let (display, screen) = MockDisplay::new(2, 16);
//! let store = config.credential_store().unwrap();
//!
//! let controller = GateController::new(keypad, servo, display, store, GateConfig::default());
//! let mut engine = build_engine(controller, &config.engine).unwrap();
//!
//! engine.tick();
//! assert_eq!(engine.current_state(), GateState::EnteringPasscode.id());
//! assert_eq!(screen.line(0), "Enter code");
//! assert_eq!(servo_handle.angle(), Some(180));
//! ```

pub mod controller;
pub mod state;

pub use controller::{GateController, build_engine};
pub use state::GateState;
