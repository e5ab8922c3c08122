//! Event-driven finite state machine engine.
//!
//! The engine runs a cooperative tick loop over a fixed set of integer states
//! (`0..N`). Each tick it polls debounced buttons and countdown timers, takes
//! at most one event from a FIFO queue, and either follows a declared
//! transition or offers the event to the application's in-state handler.
//! Application behaviour lives in a [`StateHandler`] whose hooks (entry, exit,
//! in-state event, periodic do) run synchronously on the tick thread.
//!
//! # Events
//!
//! Events are names. They come from four sources, all registered with the
//! engine before use:
//!
//! - custom events: [`Engine::add_custom_event`]
//! - timers: [`Engine::add_timer`] registers `<name>_timeout`
//! - buttons: [`Engine::add_button`] registers `<name>_press` / `<name>_release`
//! - the reserved `no_event`, evaluated on ticks where the queue is empty
//!
//! Names are unique across all sources of one engine.
//!
//! # Examples
//!
//! ```
//! use keygate_engine::{Context, Engine, Event, StateHandler, StateId};
//!
//! struct Door;
//!
//! impl StateHandler for Door {
//!     fn state_entered(
//!         &mut self,
//!         state: StateId,
//!         _event: &Event,
//!         ctx: &mut Context<'_>,
//!     ) -> anyhow::Result<()> {
//!         if state == 1 {
//!             ctx.start_timer("auto_close", std::time::Duration::from_secs(5))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut engine = Engine::new(2, Door).unwrap();
//! engine.add_custom_event("open").unwrap();
//! engine.add_timer("auto_close").unwrap();
//! engine.add_transition(0, ["open"], 1).unwrap();
//! engine.add_transition(1, ["auto_close_timeout"], 0).unwrap();
//!
//! engine.process_event("open");
//! engine.tick();
//! assert_eq!(engine.current_state(), 1);
//! ```

pub mod button;
pub mod engine;
pub mod error;
pub mod event;
pub mod handler;
pub mod table;
pub mod timer;

pub use button::ButtonService;
pub use engine::{Engine, StateTransition, TickOutcome};
pub use error::{EngineError, Result};
pub use event::{Event, EventQueue, EventRegistry, EventSender};
pub use handler::{Context, StateHandler};
pub use table::{Transition, TransitionTable};
pub use timer::{TimerMode, TimerService};

/// Integer state identifier in `[0, N)`.
pub type StateId = usize;

/// State every engine starts in.
pub const INITIAL_STATE: StateId = 0;
