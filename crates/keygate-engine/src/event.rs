//! Event names, the per-engine name registry, and the FIFO event queue.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use keygate_core::constants::{NO_EVENT, PRESS_SUFFIX, RELEASE_SUFFIX, TIMEOUT_SUFFIX};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{EngineError, Result};

/// Immutable event name.
///
/// Cloning is a reference-count bump. Compares and hashes like the `str` it
/// wraps, so maps keyed by `Event` can be queried with `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event(Arc<str>);

impl Event {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The reserved pseudo-event used when the queue is empty.
    pub fn no_event() -> Self {
        Self::new(NO_EVENT)
    }

    pub fn is_no_event(&self) -> bool {
        &*self.0 == NO_EVENT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<timer>_timeout`
    pub fn timeout(timer: &str) -> Self {
        Self::new(format!("{timer}{TIMEOUT_SUFFIX}"))
    }

    /// `<button>_press`
    pub fn press(button: &str) -> Self {
        Self::new(format!("{button}{PRESS_SUFFIX}"))
    }

    /// `<button>_release`
    pub fn release(button: &str) -> Self {
        Self::new(format!("{button}{RELEASE_SUFFIX}"))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:?})", &*self.0)
    }
}

impl Borrow<str> for Event {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Event {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Event {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Event {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl From<&str> for Event {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Event {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Event::from)
    }
}

/// Every event name known to one engine.
///
/// Starts with `no_event` registered. Names must be non-empty and free of
/// whitespace and control characters.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    names: HashSet<Event>,
}

impl EventRegistry {
    pub fn new() -> Self {
        let mut names = HashSet::new();
        names.insert(Event::no_event());
        Self { names }
    }

    /// Register a name and return its interned event.
    ///
    /// # Errors
    ///
    /// `InvalidName` for malformed names, `DuplicateName` if already known.
    pub fn register(&mut self, name: &str) -> Result<Event> {
        Self::validate(name)?;
        if self.names.contains(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        let event = Event::new(name);
        self.names.insert(event.clone());
        Ok(event)
    }

    /// Register several names atomically: none are added if any fails.
    pub fn register_all(&mut self, names: &[&str]) -> Result<Vec<Event>> {
        for (i, name) in names.iter().enumerate() {
            Self::validate(name)?;
            if self.names.contains(*name) || names[..i].contains(name) {
                return Err(EngineError::DuplicateName(name.to_string()));
            }
        }
        Ok(names
            .iter()
            .map(|name| {
                let event = Event::new(name);
                self.names.insert(event.clone());
                event
            })
            .collect())
    }

    /// Look up the interned event for a name.
    pub fn get(&self, name: &str) -> Option<Event> {
        self.names.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<Event> {
        let mut names: Vec<_> = self.names.iter().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn validate(name: &str) -> Result<()> {
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        Ok(())
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Unbounded FIFO of pending events.
///
/// The queue is the only structure shared with other producers: any number
/// of [`EventSender`]s may push from other threads, the engine is the single
/// consumer.
#[derive(Debug)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Create a producer handle.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Append an event. Never blocks.
    pub fn push(&self, event: Event) {
        trace!("Queued event {}", event);
        // The queue holds its own sender, so the channel cannot be closed.
        let _ = self.tx.send(event);
    }

    /// Take the oldest event, if any. Never blocks.
    pub fn pop(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Discard every pending event, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable, `Send` producer handle for an engine's event queue.
///
/// Pushed names are checked against the registry when the engine dequeues
/// them; unregistered names are logged and dropped there.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    /// Queue an event. Returns `false` if the engine has been dropped.
    pub fn push(&self, event: impl Into<Event>) -> bool {
        self.tx.send(event.into()).is_ok()
    }

    /// Whether the owning engine has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_event_compares_with_str() {
        let event = Event::new("close_gate");
        assert_eq!(event, "close_gate");
        assert_eq!(event.as_str(), "close_gate");
        assert_eq!(event.to_string(), "close_gate");
        assert_eq!(format!("{:?}", event), "Event(\"close_gate\")");
    }

    #[test]
    fn test_event_map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(Event::new("a"), 1);
        assert_eq!(map.get("a"), Some(&1));
    }

    #[test]
    fn test_derived_event_names() {
        assert_eq!(Event::timeout("timer1"), "timer1_timeout");
        assert_eq!(Event::press("button1"), "button1_press");
        assert_eq!(Event::release("button1"), "button1_release");
        assert!(Event::no_event().is_no_event());
        assert!(!Event::new("x").is_no_event());
    }

    #[test]
    fn test_event_serde() {
        let json = serde_json::to_string(&Event::new("open")).unwrap();
        assert_eq!(json, "\"open\"");
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, "open");
    }

    #[test]
    fn test_registry_starts_with_no_event() {
        let registry = EventRegistry::new();
        assert!(registry.contains("no_event"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = EventRegistry::new();
        registry.register("open").unwrap();
        assert_eq!(
            registry.register("open"),
            Err(EngineError::DuplicateName("open".into()))
        );
        assert_eq!(
            registry.register("no_event"),
            Err(EngineError::DuplicateName("no_event".into()))
        );
    }

    #[test]
    fn test_registry_rejects_invalid_names() {
        let mut registry = EventRegistry::new();
        for name in ["", "two words", "tab\there"] {
            assert_eq!(
                registry.register(name),
                Err(EngineError::InvalidName(name.into()))
            );
        }
    }

    #[test]
    fn test_register_all_is_atomic() {
        let mut registry = EventRegistry::new();
        registry.register("b_release").unwrap();

        let result = registry.register_all(&["b_press", "b_release"]);
        assert!(result.is_err());
        assert!(!registry.contains("b_press"));

        let result = registry.register_all(&["c", "c"]);
        assert_eq!(result, Err(EngineError::DuplicateName("c".into())));
        assert!(!registry.contains("c"));
    }

    #[test]
    fn test_registry_names_sorted() {
        let mut registry = EventRegistry::new();
        registry.register("zeta").unwrap();
        registry.register("alpha").unwrap();
        assert_eq!(registry.names(), vec!["alpha", "no_event", "zeta"]);
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(Event::new("first"));
        queue.push(Event::new("second"));
        queue.push(Event::new("first"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().unwrap(), "first");
        assert_eq!(queue.pop().unwrap(), "second");
        assert_eq!(queue.pop().unwrap(), "first");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sender_interleaves_in_order() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();

        queue.push(Event::new("a"));
        assert!(sender.push("b"));
        queue.push(Event::new("c"));

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sender_from_other_thread() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();

        std::thread::spawn(move || {
            for i in 0..10 {
                sender.push(format!("e{i}"));
            }
        })
        .join()
        .unwrap();

        for i in 0..10 {
            assert_eq!(queue.pop().unwrap(), format!("e{i}").as_str());
        }
    }

    #[test]
    fn test_sender_detects_dropped_queue() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        drop(queue);

        assert!(sender.is_closed());
        assert!(!sender.push("late"));
    }

    #[test]
    fn test_queue_clear() {
        let mut queue = EventQueue::new();
        queue.push(Event::new("a"));
        queue.push(Event::new("b"));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
