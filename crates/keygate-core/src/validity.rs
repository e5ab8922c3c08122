//! Trait for entities with temporal validity periods
//!
//! Users carry an activation flag and an optional validity window. The
//! validation algorithm (`is_valid()`) is defined once here; implementors only
//! provide data access.

use chrono::{DateTime, Utc};

/// Activation status plus an optional `[start, end]` validity window.
pub trait TemporalValidity {
    fn is_active(&self) -> bool;

    fn validity_start(&self) -> Option<DateTime<Utc>>;

    fn validity_end(&self) -> Option<DateTime<Utc>>;

    /// Check validity against the current wall clock.
    fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Check validity at a given instant. Both bounds are inclusive.
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }

        if let Some(start) = self.validity_start()
            && now < start
        {
            return false;
        }

        if let Some(end) = self.validity_end()
            && now > end
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Window {
        active: bool,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    }

    impl TemporalValidity for Window {
        fn is_active(&self) -> bool {
            self.active
        }

        fn validity_start(&self) -> Option<DateTime<Utc>> {
            self.start
        }

        fn validity_end(&self) -> Option<DateTime<Utc>> {
            self.end
        }
    }

    #[test]
    fn test_unbounded_active_is_valid() {
        let w = Window {
            active: true,
            start: None,
            end: None,
        };
        assert!(w.is_valid());
    }

    #[test]
    fn test_inactive_is_never_valid() {
        let w = Window {
            active: false,
            start: None,
            end: None,
        };
        assert!(!w.is_valid());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let now = Utc::now();
        let w = Window {
            active: true,
            start: Some(now),
            end: Some(now),
        };
        assert!(w.is_valid_at(now));
        assert!(!w.is_valid_at(now - Duration::seconds(1)));
        assert!(!w.is_valid_at(now + Duration::seconds(1)));
    }
}
