//! Application hooks and the context they run with.

use std::time::{Duration, Instant};

use tracing::warn;

use crate::StateId;
use crate::error::Result;
use crate::event::{Event, EventQueue, EventRegistry};
use crate::timer::TimerService;

/// Application behaviour driven by an [`Engine`](crate::Engine).
///
/// Every hook runs synchronously on the tick thread and must not block.
/// Long actions are split across ticks with timers. An `Err` from a hook is
/// logged by the engine and the tick carries on.
#[allow(unused_variables)]
pub trait StateHandler {
    /// Entry actions for `state`, reached through `event`.
    fn state_entered(
        &mut self,
        state: StateId,
        event: &Event,
        ctx: &mut Context<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Exit actions for `state`, left through `event`.
    fn state_left(
        &mut self,
        state: StateId,
        event: &Event,
        ctx: &mut Context<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// In-state reaction to an event with no transition out of `state`.
    ///
    /// Return `Ok(true)` if the event was handled. Also called with
    /// `no_event` on idle ticks.
    fn state_event(
        &mut self,
        state: StateId,
        event: &Event,
        ctx: &mut Context<'_>,
    ) -> anyhow::Result<bool> {
        Ok(false)
    }

    /// Periodic action, called once at the end of every tick.
    fn state_do(&mut self, state: StateId, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the engine restarts after a stop, in place of entry
    /// actions. Timers armed before the stop are gone; re-arm the ones
    /// `state` depends on here.
    fn state_resumed(&mut self, state: StateId, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Engine facilities available to a hook.
///
/// Events pushed here are queued and handled on later ticks, never
/// recursively.
pub struct Context<'a> {
    state: StateId,
    now: Instant,
    registry: &'a EventRegistry,
    queue: &'a EventQueue,
    timers: &'a mut TimerService,
    stop_requested: &'a mut bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        state: StateId,
        now: Instant,
        registry: &'a EventRegistry,
        queue: &'a EventQueue,
        timers: &'a mut TimerService,
        stop_requested: &'a mut bool,
    ) -> Self {
        Self {
            state,
            now,
            registry,
            queue,
            timers,
            stop_requested,
        }
    }

    /// State the engine is in while this hook runs. During `state_left` this
    /// is still the old state; during `state_entered` the new one.
    pub fn current_state(&self) -> StateId {
        self.state
    }

    /// Instant of the tick being processed.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Queue a registered event. Unknown names are logged and dropped.
    pub fn process_event(&mut self, name: &str) -> bool {
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

    /// Arm (or re-arm) a timer relative to the current tick.
    pub fn start_timer(&mut self, name: &str, duration: Duration) -> Result<()> {
        self.timers.start(name, duration, self.now)
    }

    /// Disarm a timer. No-op if it is not armed.
    pub fn cancel_timer(&mut self, name: &str) -> Result<()> {
        self.timers.cancel(name)
    }

    pub fn is_timer_armed(&self, name: &str) -> bool {
        self.timers.is_armed(name)
    }

    /// Ask the engine to stop after the current tick.
    pub fn stop(&mut self) {
        *self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        *self.stop_requested
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .field("pending", &self.queue.len())
            .field("stop_requested", &self.stop_requested)
            .finish_non_exhaustive()
    }
}
