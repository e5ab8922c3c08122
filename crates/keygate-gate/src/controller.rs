//! The keypad gate controller.
//!
//! Flow (state numbers as registered with the engine):
//!
//! ```text
//! 0 Ready ──enter_passcode──▶ 1 EnteringPasscode ──verify_passcode──▶ 2 Verifying
//! 2 ──correct_passcode──▶ 3 Opening ──access_granted──▶ 4 Open ──close_gate──▶ 5 Closing
//! 5 ──no_event──▶ 0        2 ──incorrect_passcode──▶ 6 Denied ──enter_passcode──▶ 0
//! ```
//!
//! Messages that must stay on screen for a while are held by the one-shot
//! `message` timer; the close countdown runs on the repeating `countdown`
//! timer. No hook ever sleeps.
//!
//! The keypad is only read while a code is being entered. Keys pressed in
//! any other state are discarded when the next entry starts.

use std::time::Duration;

use anyhow::Context as _;
use keygate_core::{CredentialStore, EngineConfig, GateConfig, User};
use keygate_engine::{Context, Engine, Event, StateHandler, StateId};
use keygate_hardware::{Display, Key, Keypad, Servo};
use tracing::{debug, info, warn};

use crate::state::GateState;

/// Custom events of the gate model, in registration order.
pub const GATE_EVENTS: [&str; 7] = [
    WAIT_FOR_INPUT,
    ENTER_PASSCODE,
    VERIFY_PASSCODE,
    CORRECT_PASSCODE,
    ACCESS_GRANTED,
    CLOSE_GATE,
    INCORRECT_PASSCODE,
];

pub const WAIT_FOR_INPUT: &str = "wait_for_input";
pub const ENTER_PASSCODE: &str = "enter_passcode";
pub const VERIFY_PASSCODE: &str = "verify_passcode";
pub const CORRECT_PASSCODE: &str = "correct_passcode";
pub const ACCESS_GRANTED: &str = "access_granted";
pub const CLOSE_GATE: &str = "close_gate";
pub const INCORRECT_PASSCODE: &str = "incorrect_passcode";

/// Holds the greeting or denial message.
pub const MESSAGE_TIMER: &str = "message";

/// Ticks once a second while the gate is open.
pub const COUNTDOWN_TIMER: &str = "countdown";

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Upper bound on keys discarded when an entry starts.
const MAX_STALE_KEYS: usize = 64;

pub const PROMPT: &str = "Enter code";
pub const GRANTED: &str = "Access Granted!";
pub const DENIED: &str = "Access Denied!";

/// State handler for the keypad gate.
pub struct GateController {
    keypad: Box<dyn Keypad>,
    servo: Box<dyn Servo>,
    display: Box<dyn Display>,
    credentials: Box<dyn CredentialStore>,
    config: GateConfig,
    entry_code: String,
    current_user: Option<User>,
    countdown: u32,
}

impl GateController {
    pub fn new(
        keypad: impl Keypad + 'static,
        servo: impl Servo + 'static,
        display: impl Display + 'static,
        credentials: impl CredentialStore + 'static,
        config: GateConfig,
    ) -> Self {
        Self {
            keypad: Box::new(keypad),
            servo: Box::new(servo),
            display: Box::new(display),
            credentials: Box::new(credentials),
            config,
            entry_code: String::new(),
            current_user: None,
            countdown: 0,
        }
    }

    /// Digits entered so far.
    pub fn entry_code(&self) -> &str {
        &self.entry_code
    }

    /// User admitted by the last verification, if it succeeded.
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Seconds left before the gate closes. Zero outside the open state.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Display writes are best effort: a failed write is logged and the flow
    /// carries on.
    fn show(&mut self, text: &str, line: usize) {
        if let Err(e) = self.display.show_text(text, line) {
            warn!("Display write failed: {}", e);
        }
    }

    fn clear_display(&mut self) {
        if let Err(e) = self.display.clear() {
            warn!("Display clear failed: {}", e);
        }
    }

    fn move_servo(&mut self, angle: u16) -> anyhow::Result<()> {
        self.servo
            .set_angle(angle)
            .with_context(|| format!("moving gate servo to {angle}"))
    }

    fn prompt(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.clear_display();
        self.show(PROMPT, 0);
        self.move_servo(self.config.closed_angle)?;
        ctx.process_event(ENTER_PASSCODE);
        Ok(())
    }

    fn verify(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        let entry = std::mem::take(&mut self.entry_code);
        self.current_user = self.credentials.verify(&entry);
        self.clear_display();

        match self.current_user.clone() {
            Some(user) => {
                info!("Access granted for {}", user);
                self.show(GRANTED, 0);
                self.show(&format!("Welcome,{}!", user.name), 1);
                self.hold_message(ctx, CORRECT_PASSCODE)
            }
            None => {
                info!("Access denied");
                self.show(DENIED, 0);
                ctx.process_event(INCORRECT_PASSCODE);
                Ok(())
            }
        }
    }

    /// Keep the current message up for the configured time, then send
    /// `follow_up`.
    fn hold_message(&mut self, ctx: &mut Context<'_>, follow_up: &str) -> anyhow::Result<()> {
        let hold = self.config.message_duration();
        if hold.is_zero() {
            ctx.process_event(follow_up);
        } else {
            ctx.start_timer(MESSAGE_TIMER, hold)?;
        }
        Ok(())
    }

    /// Re-arm the message hold after a stop. With a zero hold the follow-up
    /// event is already queued.
    fn resume_message(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        let hold = self.config.message_duration();
        if !hold.is_zero() {
            ctx.start_timer(MESSAGE_TIMER, hold)?;
        }
        Ok(())
    }

    fn open(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.move_servo(self.config.open_angle)?;
        ctx.process_event(ACCESS_GRANTED);
        Ok(())
    }

    fn start_countdown(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.countdown = self.config.close_countdown_secs;
        self.clear_display();
        if self.countdown == 0 {
            ctx.process_event(CLOSE_GATE);
            return Ok(());
        }
        self.show(&format!("Closing in {}", self.countdown), 0);
        ctx.start_timer(COUNTDOWN_TIMER, COUNTDOWN_PERIOD)?;
        Ok(())
    }

    /// Continue the countdown from where it stopped.
    fn resume_countdown(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        if self.countdown == 0 {
            return Ok(());
        }
        self.show(&format!("Closing in {}", self.countdown), 0);
        ctx.start_timer(COUNTDOWN_TIMER, COUNTDOWN_PERIOD)?;
        Ok(())
    }

    fn count_down(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            ctx.cancel_timer(COUNTDOWN_TIMER)?;
            ctx.process_event(CLOSE_GATE);
        } else {
            self.show(&format!("Closing in {}", self.countdown), 0);
        }
        Ok(())
    }

    fn discard_stale_keys(&mut self) {
        let mut discarded = 0;
        while discarded < MAX_STALE_KEYS {
            match self.keypad.scan_key() {
                Ok(Some(_)) => discarded += 1,
                Ok(None) => break,
                Err(e) => {
                    warn!("Keypad scan failed: {}", e);
                    break;
                }
            }
        }
        if discarded > 0 {
            debug!("Discarded {} keys pressed outside entry", discarded);
        }
    }

    /// Read at most one key and extend the entry code.
    fn scan_keypad(&mut self, ctx: &mut Context<'_>) {
        let key = match self.keypad.scan_key() {
            Ok(Some(key)) => key,
            Ok(None) => return,
            Err(e) => {
                warn!("Keypad scan failed: {}", e);
                return;
            }
        };

        let target = self.config.passcode_length;
        match key {
            Key::Digit(d) if self.entry_code.len() < target => {
                let Some(digit) = char::from_digit(u32::from(d), 10) else {
                    warn!("Keypad reported invalid digit {}", d);
                    return;
                };
                self.entry_code.push(digit);
                let shown = self.entry_code.clone();
                self.clear_display();
                self.show(&shown, 0);

                if self.entry_code.len() == target {
                    debug!("Passcode complete, verifying");
                    ctx.process_event(VERIFY_PASSCODE);
                }
            }
            Key::Star if !self.entry_code.is_empty() => {
                debug!("Entry cleared");
                self.entry_code.clear();
                self.clear_display();
                self.show(PROMPT, 0);
            }
            other => debug!("Ignoring key {}", other),
        }
    }
}

impl StateHandler for GateController {
    fn state_entered(
        &mut self,
        state: StateId,
        event: &Event,
        ctx: &mut Context<'_>,
    ) -> anyhow::Result<()> {
        let state = GateState::try_from(state)?;
        debug!("State {} entered on event {}", state, event);

        match state {
            GateState::Ready => self.prompt(ctx),
            GateState::EnteringPasscode => {
                self.entry_code.clear();
                self.discard_stale_keys();
                Ok(())
            }
            GateState::Verifying => self.verify(ctx),
            GateState::Opening => self.open(ctx),
            GateState::Open => self.start_countdown(ctx),
            GateState::Closing => self.move_servo(self.config.closed_angle),
            GateState::Denied => self.hold_message(ctx, ENTER_PASSCODE),
        }
    }

    fn state_left(
        &mut self,
        state: StateId,
        event: &Event,
        ctx: &mut Context<'_>,
    ) -> anyhow::Result<()> {
        debug!("State {} exited on event {}", state, event);
        if GateState::try_from(state)? == GateState::Open {
            self.countdown = 0;
            ctx.cancel_timer(COUNTDOWN_TIMER)?;
        }
        Ok(())
    }

    fn state_event(
        &mut self,
        state: StateId,
        event: &Event,
        ctx: &mut Context<'_>,
    ) -> anyhow::Result<bool> {
        let state = GateState::try_from(state)?;
        match (state, event.as_str()) {
            (GateState::Verifying, "message_timeout") => {
                ctx.process_event(CORRECT_PASSCODE);
                Ok(true)
            }
            (GateState::Denied, "message_timeout") => {
                ctx.process_event(ENTER_PASSCODE);
                Ok(true)
            }
            (GateState::Open, "countdown_timeout") => {
                self.count_down(ctx)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn state_resumed(&mut self, state: StateId, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        let state = GateState::try_from(state)?;
        debug!("Resuming in state {}", state);
        match state {
            GateState::Verifying if self.current_user.is_some() => self.resume_message(ctx),
            GateState::Denied => self.resume_message(ctx),
            GateState::Open => self.resume_countdown(ctx),
            _ => Ok(()),
        }
    }

    fn state_do(&mut self, state: StateId, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        if state == GateState::EnteringPasscode.id() {
            self.scan_keypad(ctx);
        }
        Ok(())
    }
}

impl std::fmt::Debug for GateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateController")
            .field("keypad", &self.keypad.info())
            .field("servo", &self.servo.info())
            .field("display", &self.display.info())
            .field("entry_len", &self.entry_code.len())
            .field("current_user", &self.current_user)
            .field("countdown", &self.countdown)
            .finish_non_exhaustive()
    }
}

/// Wire a controller into a seven-state engine with every event, timer and
/// transition of the gate model.
///
/// # Errors
///
/// Only if the model itself is inconsistent, which would be a bug.
pub fn build_engine(
    controller: GateController,
    config: &EngineConfig,
) -> keygate_engine::Result<Engine<GateController>> {
    let mut engine = Engine::with_config(GateState::COUNT, controller, config.clone())?;

    for name in GATE_EVENTS {
        engine.add_custom_event(name)?;
    }
    engine.add_timer(MESSAGE_TIMER)?;
    engine.add_repeating_timer(COUNTDOWN_TIMER)?;

    use GateState::*;
    engine.add_transition(Ready.id(), [ENTER_PASSCODE], EnteringPasscode.id())?;
    engine.add_transition(EnteringPasscode.id(), [VERIFY_PASSCODE], Verifying.id())?;
    engine.add_transition(Verifying.id(), [CORRECT_PASSCODE], Opening.id())?;
    engine.add_transition(Verifying.id(), [INCORRECT_PASSCODE], Denied.id())?;
    engine.add_transition(Opening.id(), [ACCESS_GRANTED], Open.id())?;
    engine.add_transition(Open.id(), [CLOSE_GATE], Closing.id())?;
    engine.add_transition(Closing.id(), ["no_event"], Ready.id())?;
    engine.add_transition(Denied.id(), [ENTER_PASSCODE], Ready.id())?;

    info!(
        "Gate model ready: {} states, {} transitions",
        engine.state_count(),
        engine.table().len()
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::{InMemoryCredentialStore, Role};
    use keygate_hardware::mock::{
        MockDisplay, MockDisplayHandle, MockKeypad, MockKeypadHandle, MockServo, MockServoHandle,
    };

    struct Rig {
        controller: GateController,
        keys: MockKeypadHandle,
        servo: MockServoHandle,
        display: MockDisplayHandle,
    }

    fn rig() -> Rig {
        let (keypad, keys) = MockKeypad::new();
        let (servo, servo_handle) = MockServo::new(16, "Gate");
        let (display, display_handle) = MockDisplay::new(2, 16);
        let store =
            InMemoryCredentialStore::from_users([User::new("Matt", "1234", Role::Admin).unwrap()])
                .unwrap();
        Rig {
            controller: GateController::new(keypad, servo, display, store, GateConfig::default()),
            keys,
            servo: servo_handle,
            display: display_handle,
        }
    }

    #[test]
    fn test_model_shape() {
        let engine = build_engine(rig().controller, &EngineConfig::default()).unwrap();
        assert_eq!(engine.state_count(), 7);
        assert_eq!(engine.table().len(), 8);
        assert_eq!(engine.table().lookup(5, "no_event"), Some(0));
        assert_eq!(engine.table().lookup(6, "enter_passcode"), Some(0));
        assert!(engine.registry().contains("message_timeout"));
        assert!(engine.registry().contains("countdown_timeout"));
    }

    #[test]
    fn test_start_prompts_and_closes() {
        let rig = rig();
        let mut engine = build_engine(rig.controller, &EngineConfig::default()).unwrap();
        engine.start();

        assert_eq!(rig.display.line(0), PROMPT);
        assert_eq!(rig.servo.angle(), Some(180));
        assert_eq!(engine.pending_events(), 1);

        engine.tick();
        assert_eq!(engine.current_state(), GateState::EnteringPasscode.id());
    }

    #[test]
    fn test_digits_shown() {
        let rig = rig();
        let mut engine = build_engine(rig.controller, &EngineConfig::default()).unwrap();
        // Entering 0 queues enter_passcode, consumed on the same tick.
        engine.tick();
        assert_eq!(engine.current_state(), 1);

        rig.keys.send_text("12").unwrap();
        engine.tick();
        engine.tick();
        assert_eq!(engine.handler().entry_code(), "12");
        assert_eq!(rig.display.line(0), "12");
    }

    #[test]
    fn test_entry_capped_at_passcode_length() {
        let rig = rig();
        let mut engine = build_engine(rig.controller, &EngineConfig::default()).unwrap();
        engine.tick();

        rig.keys.send_text("12345").unwrap();
        for _ in 0..3 {
            engine.tick();
        }
        // Keep verify_passcode behind other events so one more key is read
        // while the entry is already full.
        engine.process_event(WAIT_FOR_INPUT);
        engine.process_event(WAIT_FOR_INPUT);
        engine.tick();
        assert_eq!(engine.handler().entry_code(), "1234");
        assert_eq!(engine.pending_events(), 2);

        engine.tick();
        assert_eq!(engine.current_state(), GateState::EnteringPasscode.id());
        assert_eq!(engine.handler().entry_code(), "1234");
        assert_eq!(rig.display.line(0), "1234");
        assert_eq!(engine.pending_events(), 1);

        engine.tick();
        assert_eq!(engine.current_state(), GateState::Verifying.id());
        assert_eq!(engine.pending_events(), 0);
        assert_eq!(
            engine.handler().current_user().map(|u| u.name.as_str()),
            Some("Matt")
        );
    }

    #[test]
    fn test_keys_before_entry_discarded() {
        let rig = rig();
        rig.keys.send_text("98").unwrap();
        let mut engine = build_engine(rig.controller, &EngineConfig::default()).unwrap();
        engine.tick();
        assert_eq!(engine.current_state(), 1);

        rig.keys.send_text("1").unwrap();
        engine.tick();
        assert_eq!(engine.handler().entry_code(), "1");
    }

    #[test]
    fn test_star_clears_entry() {
        let rig = rig();
        let mut engine = build_engine(rig.controller, &EngineConfig::default()).unwrap();
        engine.tick();
        engine.tick();

        rig.keys.send_text("9*").unwrap();
        engine.tick();
        engine.tick();
        assert_eq!(engine.handler().entry_code(), "");
        assert_eq!(rig.display.line(0), PROMPT);
    }

    #[test]
    fn test_letters_ignored() {
        let rig = rig();
        let mut engine = build_engine(rig.controller, &EngineConfig::default()).unwrap();
        engine.tick();
        engine.tick();

        rig.keys.send_text("A#1").unwrap();
        for _ in 0..3 {
            engine.tick();
        }
        assert_eq!(engine.handler().entry_code(), "1");
    }
}
