//! Named countdown timers.
//!
//! Timers never call back into the application. The engine polls them once
//! per tick with the tick's `Instant`; expired timers yield their
//! `<name>_timeout` event, which the engine queues like any other event.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fires once per `start`, then disarms.
    OneShot,

    /// Fires every period until cancelled.
    Repeating,
}

#[derive(Debug, Clone)]
struct Timer {
    name: String,
    event: Event,
    mode: TimerMode,
    period: Duration,
    deadline: Option<Instant>,
}

/// Registered timers in registration order.
#[derive(Debug, Clone, Default)]
pub struct TimerService {
    timers: Vec<Timer>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a disarmed timer. Name uniqueness across the engine is
    /// enforced by the event registry before this is called.
    pub(crate) fn add(&mut self, name: &str, event: Event, mode: TimerMode) -> Result<()> {
        if self.find(name).is_some() {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        self.timers.push(Timer {
            name: name.to_string(),
            event,
            mode,
            period: Duration::ZERO,
            deadline: None,
        });
        Ok(())
    }

    /// Arm (or re-arm) a timer to expire `duration` after `now`.
    ///
    /// # Errors
    ///
    /// `UnknownTimer` if not registered, `InvalidDuration` for a zero duration.
    pub fn start(&mut self, name: &str, duration: Duration, now: Instant) -> Result<()> {
        if duration.is_zero() {
            return Err(EngineError::InvalidDuration(name.to_string()));
        }
        let timer = self.find_mut(name)?;
        timer.period = duration;
        timer.deadline = Some(now + duration);
        debug!("Timer {} armed for {:?}", name, duration);
        Ok(())
    }

    /// Disarm a timer. Cancelling an unarmed timer is a no-op.
    ///
    /// # Errors
    ///
    /// `UnknownTimer` if not registered.
    pub fn cancel(&mut self, name: &str) -> Result<()> {
        let timer = self.find_mut(name)?;
        if timer.deadline.take().is_some() {
            debug!("Timer {} cancelled", name);
        }
        Ok(())
    }

    /// Disarm every timer.
    pub fn cancel_all(&mut self) {
        for timer in &mut self.timers {
            timer.deadline = None;
        }
    }

    /// Whether a timer is armed. `false` for unknown names.
    pub fn is_armed(&self, name: &str) -> bool {
        self.find(name).is_some_and(|t| t.deadline.is_some())
    }

    /// Time left before expiry, `None` if unarmed or unknown.
    pub fn remaining(&self, name: &str, now: Instant) -> Option<Duration> {
        self.find(name)?
            .deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Collect expiry events for every timer whose deadline is at or before
    /// `now`, in registration order.
    ///
    /// A one-shot timer disarms. A repeating timer moves its deadline one
    /// period forward; if the loop fell behind by more than a period, missed
    /// periods are skipped rather than fired in a burst.
    pub fn poll(&mut self, now: Instant) -> Vec<Event> {
        let mut expired = Vec::new();
        for timer in &mut self.timers {
            let Some(deadline) = timer.deadline else {
                continue;
            };
            if now < deadline {
                continue;
            }

            trace!("Timer {} expired", timer.name);
            expired.push(timer.event.clone());

            timer.deadline = match timer.mode {
                TimerMode::OneShot => None,
                TimerMode::Repeating => {
                    let next = deadline + timer.period;
                    if next <= now {
                        Some(now + timer.period)
                    } else {
                        Some(next)
                    }
                }
            };
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Registered timer names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.timers.iter().map(|t| t.name.as_str())
    }

    fn find(&self, name: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Timer> {
        self.timers
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::UnknownTimer(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TimerService {
        let mut timers = TimerService::new();
        timers
            .add("message", Event::timeout("message"), TimerMode::OneShot)
            .unwrap();
        timers
            .add("countdown", Event::timeout("countdown"), TimerMode::Repeating)
            .unwrap();
        timers
    }

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_new_timers_are_unarmed() {
        let timers = service();
        assert!(!timers.is_armed("message"));
        assert!(!timers.is_armed("countdown"));
        assert_eq!(timers.names().collect::<Vec<_>>(), vec!["message", "countdown"]);
    }

    #[test]
    fn test_one_shot_fires_exactly_once() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("message", 2 * SEC, t0).unwrap();

        assert!(timers.poll(t0 + SEC).is_empty());
        assert_eq!(timers.poll(t0 + 2 * SEC), vec![Event::timeout("message")]);
        assert!(timers.poll(t0 + 3 * SEC).is_empty());
        assert!(timers.poll(t0 + 10 * SEC).is_empty());
        assert!(!timers.is_armed("message"));
    }

    #[test]
    fn test_restart_rearms_one_shot() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("message", SEC, t0).unwrap();
        assert_eq!(timers.poll(t0 + SEC).len(), 1);

        timers.start("message", SEC, t0 + SEC).unwrap();
        assert_eq!(timers.poll(t0 + 2 * SEC).len(), 1);
    }

    #[test]
    fn test_start_resets_deadline() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("message", SEC, t0).unwrap();
        timers.start("message", 5 * SEC, t0).unwrap();

        assert!(timers.poll(t0 + 2 * SEC).is_empty());
        assert_eq!(timers.remaining("message", t0 + 2 * SEC), Some(3 * SEC));
    }

    #[test]
    fn test_repeating_fires_each_period() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("countdown", SEC, t0).unwrap();

        let mut fired = 0;
        let mut t = t0;
        for _ in 0..50 {
            t += Duration::from_millis(100);
            fired += timers.poll(t).len();
        }
        assert_eq!(fired, 5);
        assert!(timers.is_armed("countdown"));
    }

    #[test]
    fn test_repeating_skips_missed_periods() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("countdown", SEC, t0).unwrap();

        assert_eq!(timers.poll(t0 + 10 * SEC).len(), 1);
        assert_eq!(timers.remaining("countdown", t0 + 10 * SEC), Some(SEC));
    }

    #[test]
    fn test_cancel_unarmed_is_noop() {
        let mut timers = service();
        timers.cancel("message").unwrap();
        timers.cancel("message").unwrap();
        assert!(!timers.is_armed("message"));
    }

    #[test]
    fn test_cancel_prevents_expiry() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("countdown", SEC, t0).unwrap();
        timers.cancel("countdown").unwrap();

        assert!(timers.poll(t0 + 5 * SEC).is_empty());
        assert_eq!(timers.remaining("countdown", t0), None);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("message", SEC, t0).unwrap();
        timers.start("countdown", SEC, t0).unwrap();

        timers.cancel_all();
        assert!(timers.poll(t0 + 5 * SEC).is_empty());
    }

    #[test]
    fn test_unknown_timer() {
        let mut timers = service();
        let t0 = Instant::now();
        assert_eq!(
            timers.start("nope", SEC, t0),
            Err(EngineError::UnknownTimer("nope".into()))
        );
        assert_eq!(
            timers.cancel("nope"),
            Err(EngineError::UnknownTimer("nope".into()))
        );
        assert!(!timers.is_armed("nope"));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut timers = service();
        assert_eq!(
            timers.start("message", Duration::ZERO, Instant::now()),
            Err(EngineError::InvalidDuration("message".into()))
        );
    }

    #[test]
    fn test_expiry_order_follows_registration() {
        let mut timers = service();
        let t0 = Instant::now();
        timers.start("countdown", SEC, t0).unwrap();
        timers.start("message", SEC, t0).unwrap();

        assert_eq!(
            timers.poll(t0 + SEC),
            vec![Event::timeout("message"), Event::timeout("countdown")]
        );
    }

    #[test]
    fn test_duplicate_timer_rejected() {
        let mut timers = service();
        assert!(
            timers
                .add("message", Event::timeout("message"), TimerMode::OneShot)
                .is_err()
        );
    }
}
