//! Per-identity cooldown between accepted attendance events.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Process-local map of identity → last accepted timestamp.
///
/// Check and mark happen in one critical section, so no two admissions for
/// the same identity can land within the window regardless of interleaving.
/// State lives only for the process lifetime; restart clears it.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    marks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            marks: Mutex::new(HashMap::new()),
        }
    }

    /// Admit the identity and mark `now`, or report the time remaining in
    /// its cooldown window.
    pub fn check_and_mark(&self, identity_id: &str, now: DateTime<Utc>) -> Result<(), Duration> {
        let mut marks = self.marks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = marks.get(identity_id) {
            let elapsed = (now - *last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.window {
                return Err(self.window - elapsed);
            }
        }
        marks.insert(identity_id.to_string(), now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_admission_passes() {
        let t = CooldownTracker::new(Duration::from_secs(30));
        assert!(t.check_and_mark("alice", at(0)).is_ok());
    }

    #[test]
    fn test_window_enforced_then_released() {
        let t = CooldownTracker::new(Duration::from_secs(30));
        assert!(t.check_and_mark("alice", at(0)).is_ok());

        let remaining = t.check_and_mark("alice", at(10)).unwrap_err();
        assert_eq!(remaining, Duration::from_secs(20));

        // The rejected attempt must not refresh the mark.
        let remaining = t.check_and_mark("alice", at(29)).unwrap_err();
        assert_eq!(remaining, Duration::from_secs(1));

        assert!(t.check_and_mark("alice", at(31)).is_ok());
    }

    #[test]
    fn test_identities_tracked_independently() {
        let t = CooldownTracker::new(Duration::from_secs(30));
        assert!(t.check_and_mark("alice", at(0)).is_ok());
        assert!(t.check_and_mark("bob", at(1)).is_ok());
        assert!(t.check_and_mark("alice", at(5)).is_err());
        assert!(t.check_and_mark("bob", at(5)).is_err());
    }

    #[test]
    fn test_clock_regression_does_not_underflow() {
        let t = CooldownTracker::new(Duration::from_secs(30));
        assert!(t.check_and_mark("alice", at(100)).is_ok());
        // A fix arriving with an earlier timestamp is still inside the window.
        let remaining = t.check_and_mark("alice", at(90)).unwrap_err();
        assert_eq!(remaining, Duration::from_secs(30));
    }
}
