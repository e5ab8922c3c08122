//! Shared constants for the gate controller and its state engine.
//!
//! Values here are the defaults used when no configuration file overrides
//! them. The engine timing constants match the cooperative loop described in
//! the `keygate-engine` crate; the gate constants match the demonstration
//! hardware (4-digit keypad code, hobby servo, 16x2 character LCD).

// ============================================================================
// Engine timing
// ============================================================================

/// Default interval between two engine ticks, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default time a button level must stay stable before an edge fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 20;

/// Number of transitions kept in the engine history.
///
/// Each entry is a pair of state ids, an event handle and an `Instant`, so
/// 100 entries stay well under 8KB while still covering a dozen full
/// access cycles of the gate flow.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

// ============================================================================
// Event naming
// ============================================================================

/// Reserved pseudo-event evaluated on ticks where the queue is empty.
pub const NO_EVENT: &str = "no_event";

/// Suffix appended to a timer name to form its expiry event.
pub const TIMEOUT_SUFFIX: &str = "_timeout";

/// Suffix appended to a button name to form its press (falling edge) event.
pub const PRESS_SUFFIX: &str = "_press";

/// Suffix appended to a button name to form its release (rising edge) event.
pub const RELEASE_SUFFIX: &str = "_release";

// ============================================================================
// Gate defaults
// ============================================================================

/// Number of digits in a keypad passcode.
pub const DEFAULT_PASSCODE_LENGTH: usize = 4;

/// Minimum accepted passcode length.
pub const MIN_PASSCODE_LENGTH: usize = 4;

/// Maximum accepted passcode length.
pub const MAX_PASSCODE_LENGTH: usize = 8;

/// Servo angle for the open gate, in degrees.
pub const DEFAULT_OPEN_ANGLE: u16 = 90;

/// Servo angle for the closed gate, in degrees.
pub const DEFAULT_CLOSED_ANGLE: u16 = 180;

/// Largest angle a hobby servo accepts.
pub const MAX_SERVO_ANGLE: u16 = 180;

/// Seconds counted down on the display before the gate closes.
pub const DEFAULT_CLOSE_COUNTDOWN_SECS: u32 = 5;

/// Seconds a granted/denied message stays on screen.
pub const DEFAULT_MESSAGE_SECS: u64 = 2;

// ============================================================================
// Display defaults
// ============================================================================

/// Text lines on the character LCD.
pub const DEFAULT_DISPLAY_LINES: usize = 2;

/// Characters per line on the character LCD.
pub const DEFAULT_DISPLAY_COLUMNS: usize = 16;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "keygate.toml";

/// Environment variable overriding the engine poll interval.
pub const ENV_POLL_INTERVAL_MS: &str = "KEYGATE_POLL_INTERVAL_MS";
