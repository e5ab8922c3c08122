//! Named states of the gate model.

use std::fmt;

use keygate_engine::{EngineError, StateId};

/// The seven states of the access flow, numbered as the engine sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum GateState {
    /// Prompt shown, gate closed.
    Ready = 0,

    /// Collecting digits from the keypad.
    EnteringPasscode = 1,

    /// Checking the entered code; greeting held on success.
    Verifying = 2,

    /// Servo driven to the open angle.
    Opening = 3,

    /// Gate open, counting down to close.
    Open = 4,

    /// Servo driven back to the closed angle.
    Closing = 5,

    /// Denial message held before returning to the prompt.
    Denied = 6,
}

impl GateState {
    pub const COUNT: usize = 7;

    pub const ALL: [GateState; Self::COUNT] = [
        Self::Ready,
        Self::EnteringPasscode,
        Self::Verifying,
        Self::Opening,
        Self::Open,
        Self::Closing,
        Self::Denied,
    ];

    pub const fn id(self) -> StateId {
        self as StateId
    }
}

impl From<GateState> for StateId {
    fn from(state: GateState) -> Self {
        state.id()
    }
}

impl TryFrom<StateId> for GateState {
    type Error = EngineError;

    fn try_from(state: StateId) -> Result<Self, Self::Error> {
        Self::ALL
            .get(state)
            .copied()
            .ok_or(EngineError::InvalidState {
                state,
                count: Self::COUNT,
            })
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::EnteringPasscode => "entering_passcode",
            Self::Verifying => "verifying",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Denied => "denied",
        };
        f.write_str(name)
    }
}
