//! The state machine engine and its tick loop.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use keygate_core::EngineConfig;
use keygate_hardware::DigitalInput;
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::button::ButtonService;
use crate::error::{EngineError, Result};
use crate::event::{Event, EventQueue, EventRegistry, EventSender};
use crate::handler::{Context, StateHandler};
use crate::table::TransitionTable;
use crate::timer::{TimerMode, TimerService};
use crate::{INITIAL_STATE, StateId};

/// Record of a single state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: StateId,

    /// The state transitioned to.
    pub to: StateId,

    /// The event that triggered the transition.
    pub event: Event,

    /// When the transition occurred.
    ///
    /// Not serialized: a deserialized record carries the time of
    /// deserialization.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: StateId, to: StateId, event: Event) -> Self {
        Self::at(from, to, event, Instant::now())
    }

    pub fn at(from: StateId, to: StateId, event: Event, timestamp: Instant) -> Self {
        Self {
            from,
            to,
            event,
            timestamp,
        }
    }

    /// Time since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// What a single tick did with the event it evaluated.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// A declared transition was followed.
    Transitioned(StateTransition),

    /// No transition matched and `state_event` handled the event.
    Handled(Event),

    /// No transition matched and nothing handled the event.
    Dropped(Event),

    /// The queue was empty and nothing reacted to `no_event`.
    Idle,
}

impl TickOutcome {
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transitioned(_))
    }
}

/// Event-driven finite state machine over states `0..N`.
///
/// The engine owns the transition table, the event registry and queue, the
/// timers and the buttons. Application behaviour is supplied by the
/// [`StateHandler`] `H`.
///
/// # Examples
///
/// ```
/// use keygate_engine::{Engine, StateHandler};
///
/// struct Nop;
/// impl StateHandler for Nop {}
///
/// let mut engine = Engine::new(3, Nop).unwrap();
/// engine.add_custom_event("next").unwrap();
/// engine.add_transition(0, ["next"], 1).unwrap();
/// engine.add_transition(1, ["next"], 2).unwrap();
/// engine.add_transition(2, ["next", "no_event"], 0).unwrap();
///
/// engine.process_event("next");
/// engine.process_event("next");
/// engine.tick();
/// engine.tick();
/// assert_eq!(engine.current_state(), 2);
///
/// // An idle tick evaluates `no_event`.
/// engine.tick();
/// assert_eq!(engine.current_state(), 0);
/// assert_eq!(engine.history().len(), 3);
/// ```
///
/// # Thread Safety
///
/// The engine itself is driven from one task. Other threads feed it through
/// [`EventSender`] handles obtained from [`Engine::event_sender`].
pub struct Engine<H: StateHandler> {
    handler: H,
    config: EngineConfig,
    table: TransitionTable,
    registry: EventRegistry,
    queue: EventQueue,
    timers: TimerService,
    buttons: ButtonService,
    current_state: StateId,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
    started: bool,
    running: bool,
    stop_requested: bool,
}

impl<H: StateHandler> Engine<H> {
    /// Create an engine with `state_count` states and default timing.
    ///
    /// # Errors
    ///
    /// `InvalidStateCount` if `state_count` is zero.
    pub fn new(state_count: usize, handler: H) -> Result<Self> {
        Self::with_config(state_count, handler, EngineConfig::default())
    }

    pub fn with_config(state_count: usize, handler: H, config: EngineConfig) -> Result<Self> {
        let table = TransitionTable::new(state_count)?;
        Ok(Self {
            handler,
            table,
            registry: EventRegistry::new(),
            queue: EventQueue::new(),
            timers: TimerService::new(),
            buttons: ButtonService::new(config.debounce()),
            current_state: INITIAL_STATE,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(config.history_size),
            started: false,
            running: false,
            stop_requested: false,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Model declaration
    // ------------------------------------------------------------------

    /// Register an application event.
    ///
    /// # Errors
    ///
    /// `InvalidName` or `DuplicateName`.
    pub fn add_custom_event(&mut self, name: &str) -> Result<Event> {
        self.registry.register(name)
    }

    /// Register a one-shot timer and its `<name>_timeout` event.
    pub fn add_timer(&mut self, name: &str) -> Result<Event> {
        self.add_timer_with_mode(name, TimerMode::OneShot)
    }

    /// Register a timer that fires every period until cancelled.
    pub fn add_repeating_timer(&mut self, name: &str) -> Result<Event> {
        self.add_timer_with_mode(name, TimerMode::Repeating)
    }

    fn add_timer_with_mode(&mut self, name: &str, mode: TimerMode) -> Result<Event> {
        EventRegistry::validate(name)?;
        if self.timers.names().any(|t| t == name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        let event = self.registry.register(Event::timeout(name).as_str())?;
        self.timers.add(name, event.clone(), mode)?;
        debug!("Registered {:?} timer {}", mode, name);
        Ok(event)
    }

    /// Register a debounced active-low button on `pin` and its
    /// `<name>_press` / `<name>_release` events.
    pub fn add_button(
        &mut self,
        name: &str,
        pin: impl DigitalInput + 'static,
    ) -> Result<(Event, Event)> {
        EventRegistry::validate(name)?;
        if self.buttons.names().any(|b| b == name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        let press = Event::press(name);
        let release = Event::release(name);
        let events = self
            .registry
            .register_all(&[press.as_str(), release.as_str()])?;
        let (press, release) = (events[0].clone(), events[1].clone());
        self.buttons
            .add(name, Box::new(pin), press.clone(), release.clone())?;
        debug!("Registered button {}", name);
        Ok((press, release))
    }

    /// Declare that any of `events` moves `source` to `dest`.
    ///
    /// # Errors
    ///
    /// - `UnknownEvent` if a name was never registered
    /// - `InvalidState`, `EmptyEventSet`, `DuplicateEvent` from the table
    ///
    /// A failed call leaves the model unchanged.
    pub fn add_transition<I, S>(&mut self, source: StateId, events: I, dest: StateId) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let events = events
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                self.registry
                    .get(name)
                    .ok_or_else(|| EngineError::UnknownEvent(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.table.add(source, events, dest)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Queue a registered event for a later tick.
    ///
    /// Returns `false` (and logs) if the name is not registered.
    pub fn process_event(&self, name: &str) -> bool {
        match self.registry.get(name) {
            Some(event) => {
                self.queue.push(event);
                true
            }
            None => {
                warn!("Dropping unregistered event {:?}", name);
                false
            }
        }
    }

    /// Producer handle usable from other threads or tasks.
    pub fn event_sender(&self) -> EventSender {
        self.queue.sender()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start or resume the engine.
    ///
    /// The first start runs the entry actions of state 0 with `no_event`.
    /// Resuming after [`stop`](Self::stop) re-arms the buttons and calls
    /// [`StateHandler::state_resumed`] instead of re-entering the current
    /// state. A stop requested by either hook takes effect immediately.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    fn start_at(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.stop_requested = false;
        self.buttons.arm_all();

        if self.started {
            info!("State machine resumed in state {}", self.current_state);
            self.resume(now);
        } else {
            self.started = true;
            self.state_entered_at = now;
            info!(
                "State machine started with {} states, {} transitions",
                self.table.state_count(),
                self.table.len()
            );
            self.enter(INITIAL_STATE, &Event::no_event(), now);
        }

        if self.stop_requested {
            self.stop();
        }
    }

    /// Halt the engine between ticks.
    ///
    /// Every timer is disarmed and button polling stops. The current state
    /// and any queued events are kept; [`start`](Self::start),
    /// [`tick`](Self::tick) or [`run`](Self::run) resume from them.
    pub fn stop(&mut self) {
        self.stop_requested = false;
        if !self.running {
            return;
        }
        self.running = false;
        self.timers.cancel_all();
        self.buttons.disarm_all();
        info!("State machine stopped in state {}", self.current_state);
    }

    /// Run one tick now.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    /// Run one tick as if the clock read `now`.
    ///
    /// Starts (or resumes) the engine if needed, then:
    /// 1. polls buttons and 2. timers, queueing their events;
    /// 3. takes one event, or `no_event` if the queue is empty;
    /// 4. follows a matching transition, or else
    /// 5. offers the event to `state_event`;
    /// 6. calls `state_do`.
    ///
    /// A stop requested by a hook takes effect after the tick. If starting
    /// the engine already stopped it, nothing else runs and the tick is
    /// [`TickOutcome::Idle`].
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        self.start_at(now);
        if !self.running {
            return TickOutcome::Idle;
        }

        for event in self.buttons.poll(now) {
            self.queue.push(event);
        }
        for event in self.timers.poll(now) {
            self.queue.push(event);
        }

        let event = self.next_event();
        let state = self.current_state;

        let outcome = match self.table.lookup(state, event.as_str()) {
            Some(dest) => TickOutcome::Transitioned(self.transition(dest, event, now)),
            None => {
                if self.offer(state, &event, now) {
                    TickOutcome::Handled(event)
                } else if event.is_no_event() {
                    TickOutcome::Idle
                } else {
                    debug!("State {} dropped event {}", state, event);
                    TickOutcome::Dropped(event)
                }
            }
        };

        let state = self.current_state;
        let mut ctx = Context::new(
            state,
            now,
            &self.registry,
            &self.queue,
            &mut self.timers,
            &mut self.stop_requested,
        );
        if let Err(e) = self.handler.state_do(state, &mut ctx) {
            error!("state_do failed in state {}: {:#}", state, e);
        }

        if self.stop_requested {
            self.stop();
        }
        outcome
    }

    /// Run until a hook calls [`Context::stop`].
    pub async fn run(&mut self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Tick every poll interval until `shutdown` completes or a hook stops
    /// the engine. The engine is stopped on return and can be run again.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) {
        self.start();

        let period = self.config.poll_interval().max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        while self.running {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.tick_at(Instant::now());
                }
            }
        }
        self.stop();
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn current_state(&self) -> StateId {
        self.current_state
    }

    pub fn state_count(&self) -> usize {
        self.table.state_count()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the initial state has been entered.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Recorded transitions, oldest first, bounded by the configured
    /// history size.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Number of queued events not yet processed.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn timers(&self) -> &TimerService {
        &self.timers
    }

    pub fn buttons(&self) -> &ButtonService {
        &self.buttons
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Oldest registered event in the queue, or `no_event`.
    ///
    /// Names pushed through an [`EventSender`] are checked here.
    fn next_event(&mut self) -> Event {
        while let Some(event) = self.queue.pop() {
            match self.registry.get(event.as_str()) {
                Some(event) => return event,
                None => warn!("Dropping unregistered event {:?}", event.as_str()),
            }
        }
        Event::no_event()
    }

    fn transition(&mut self, dest: StateId, event: Event, now: Instant) -> StateTransition {
        let from = self.current_state;

        let mut ctx = Context::new(
            from,
            now,
            &self.registry,
            &self.queue,
            &mut self.timers,
            &mut self.stop_requested,
        );
        if let Err(e) = self.handler.state_left(from, &event, &mut ctx) {
            error!("state_left failed in state {} on {}: {:#}", from, event, e);
        }

        self.current_state = dest;
        self.state_entered_at = now;

        let transition = StateTransition::at(from, dest, event.clone(), now);
        self.add_to_history(transition.clone());

        if self.config.debug {
            info!("State {} -> {} on {}", from, dest, event);
        } else {
            debug!("State {} -> {} on {}", from, dest, event);
        }

        self.enter(dest, &event, now);
        transition
    }

    fn enter(&mut self, state: StateId, event: &Event, now: Instant) {
        let mut ctx = Context::new(
            state,
            now,
            &self.registry,
            &self.queue,
            &mut self.timers,
            &mut self.stop_requested,
        );
        if let Err(e) = self.handler.state_entered(state, event, &mut ctx) {
            error!("state_entered failed in state {} on {}: {:#}", state, event, e);
        }
    }

    fn resume(&mut self, now: Instant) {
        let state = self.current_state;
        let mut ctx = Context::new(
            state,
            now,
            &self.registry,
            &self.queue,
            &mut self.timers,
            &mut self.stop_requested,
        );
        if let Err(e) = self.handler.state_resumed(state, &mut ctx) {
            error!("state_resumed failed in state {}: {:#}", state, e);
        }
    }

    /// Offer an unmatched event to the handler. Errors count as unhandled.
    fn offer(&mut self, state: StateId, event: &Event, now: Instant) -> bool {
        let mut ctx = Context::new(
            state,
            now,
            &self.registry,
            &self.queue,
            &mut self.timers,
            &mut self.stop_requested,
        );
        match self.handler.state_event(state, event, &mut ctx) {
            Ok(handled) => handled,
            Err(e) => {
                error!("state_event failed in state {} on {}: {:#}", state, event, e);
                false
            }
        }
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
    }
}

impl<H: StateHandler + std::fmt::Debug> std::fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("handler", &self.handler)
            .field("current_state", &self.current_state)
            .field("state_count", &self.table.state_count())
            .field("running", &self.running)
            .field("pending_events", &self.queue.len())
            .finish_non_exhaustive()
    }
}
