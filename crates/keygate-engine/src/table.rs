//! Transition table: `(state, event) -> destination`.

use std::collections::HashMap;

use crate::StateId;
use crate::error::{EngineError, Result};
use crate::event::Event;

/// A declared edge of the state graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub source: StateId,
    pub events: Vec<Event>,
    pub dest: StateId,
}

/// Maps `(source state, event)` to a destination state.
///
/// For a fixed source an event appears in at most one transition. Failed
/// registrations leave the table untouched.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rows: Vec<HashMap<Event, StateId>>,
    transitions: Vec<Transition>,
}

impl TransitionTable {
    /// Create an empty table for states `0..state_count`.
    ///
    /// # Errors
    ///
    /// `InvalidStateCount` if `state_count` is zero.
    pub fn new(state_count: usize) -> Result<Self> {
        if state_count == 0 {
            return Err(EngineError::InvalidStateCount);
        }
        Ok(Self {
            rows: vec![HashMap::new(); state_count],
            transitions: Vec::new(),
        })
    }

    pub fn state_count(&self) -> usize {
        self.rows.len()
    }

    /// Check that `state` is in range.
    pub fn check_state(&self, state: StateId) -> Result<()> {
        if state >= self.rows.len() {
            return Err(EngineError::InvalidState {
                state,
                count: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Declare that any of `events` moves `source` to `dest`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if either state is out of range
    /// - `EmptyEventSet` if `events` is empty
    /// - `DuplicateEvent` if an event already leaves `source`, or is listed twice
    pub fn add(&mut self, source: StateId, events: Vec<Event>, dest: StateId) -> Result<()> {
        self.check_state(source)?;
        self.check_state(dest)?;

        if events.is_empty() {
            return Err(EngineError::EmptyEventSet(source));
        }

        let row = &self.rows[source];
        for (i, event) in events.iter().enumerate() {
            if row.contains_key(event) || events[..i].contains(event) {
                return Err(EngineError::DuplicateEvent {
                    state: source,
                    event: event.to_string(),
                });
            }
        }

        let row = &mut self.rows[source];
        for event in &events {
            row.insert(event.clone(), dest);
        }
        self.transitions.push(Transition {
            source,
            events,
            dest,
        });
        Ok(())
    }

    /// Destination for `event` in `source`, if a transition is declared.
    pub fn lookup(&self, source: StateId, event: &str) -> Option<StateId> {
        self.rows.get(source)?.get(event).copied()
    }

    /// Events that leave `source`, sorted.
    pub fn events_from(&self, source: StateId) -> Vec<Event> {
        let mut events: Vec<_> = self
            .rows
            .get(source)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        events.sort();
        events
    }

    /// Declared transitions in registration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
