//! Debounced push buttons.
//!
//! Buttons are active-low: a debounced falling edge yields `<name>_press`, a
//! rising edge `<name>_release`. A new level must be observed continuously
//! for the debounce window before its edge fires, which filters contact
//! bounce shorter than the window.

use std::time::{Duration, Instant};

use keygate_hardware::DigitalInput;
use tracing::{trace, warn};

use crate::error::{EngineError, Result};
use crate::event::Event;

struct Button {
    name: String,
    pin: Box<dyn DigitalInput>,
    press: Event,
    release: Event,
    /// Last level that produced (or would have produced) an edge event.
    debounced_high: bool,
    /// Level that differs from `debounced_high`, and when it was first seen.
    candidate: Option<(bool, Instant)>,
}

impl Button {
    fn read(&mut self) -> Option<bool> {
        match self.pin.is_high() {
            Ok(level) => Some(level),
            Err(e) => {
                warn!("Button {} read failed: {}", self.name, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button")
            .field("name", &self.name)
            .field("debounced_high", &self.debounced_high)
            .field("candidate", &self.candidate)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ButtonService {
    buttons: Vec<Button>,
    debounce: Duration,
    armed: bool,
}

impl ButtonService {
    pub fn new(debounce: Duration) -> Self {
        Self {
            buttons: Vec::new(),
            debounce,
            armed: true,
        }
    }

    /// Register a button. The current pin level becomes its baseline; an
    /// unreadable pin is assumed released.
    pub(crate) fn add(
        &mut self,
        name: &str,
        pin: Box<dyn DigitalInput>,
        press: Event,
        release: Event,
    ) -> Result<()> {
        if self.buttons.iter().any(|b| b.name == name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        let mut button = Button {
            name: name.to_string(),
            pin,
            press,
            release,
            debounced_high: true,
            candidate: None,
        };
        if let Some(level) = button.read() {
            button.debounced_high = level;
        }
        self.buttons.push(button);
        Ok(())
    }

    /// Sample every button and return debounced edge events in
    /// registration order. Returns nothing while disarmed.
    pub fn poll(&mut self, now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.armed {
            return events;
        }

        for button in &mut self.buttons {
            let Some(level) = button.read() else {
                continue;
            };

            if level == button.debounced_high {
                if button.candidate.take().is_some() {
                    trace!("Button {} bounce filtered", button.name);
                }
                continue;
            }

            let since = match button.candidate {
                Some((candidate, since)) if candidate == level => since,
                _ => {
                    button.candidate = Some((level, now));
                    now
                }
            };

            if now.saturating_duration_since(since) >= self.debounce {
                button.debounced_high = level;
                button.candidate = None;
                let event = if level {
                    button.release.clone()
                } else {
                    button.press.clone()
                };
                trace!("Button {} edge: {}", button.name, event);
                events.push(event);
            }
        }
        events
    }

    /// Resume polling, taking each pin's current level as the new baseline
    /// so that changes made while disarmed do not fire.
    pub fn arm_all(&mut self) {
        for button in &mut self.buttons {
            if let Some(level) = button.read() {
                button.debounced_high = level;
            }
            button.candidate = None;
        }
        self.armed = true;
    }

    /// Stop polling.
    pub fn disarm_all(&mut self) {
        self.armed = false;
        for button in &mut self.buttons {
            button.candidate = None;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Debounced level of a button (`true` = released). `None` if unknown.
    pub fn is_released(&self, name: &str) -> Option<bool> {
        self.buttons
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.debounced_high)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buttons.iter().map(|b| b.name.as_str())
    }
}
