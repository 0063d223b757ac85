use chrono::Utc;

/// Seconds between two rename-triggering transitions of the same channel.
/// Two renames per ten minutes are allowed by the platform; 305s leaves slack.
pub const RENAME_COOLDOWN_SECS: i64 = 305;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Per-channel cooldown keyed on the group's `last_rename` stamp.
#[derive(Debug, Clone, Copy)]
pub struct RenameCooldown {
    window_secs: i64,
}

impl Default for RenameCooldown {
    fn default() -> Self {
        Self::new(RENAME_COOLDOWN_SECS)
    }
}

impl RenameCooldown {
    pub fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    /// Seconds left before the next rename is allowed, or `None` if it is
    /// allowed now. A channel that was never renamed is never blocked.
    pub fn remaining(&self, last_rename: Option<i64>, now: i64) -> Option<i64> {
        let last = last_rename?;
        let seconds = last + self.window_secs - now;
        (seconds > 0).then_some(seconds)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[test]
    fn test_never_renamed_is_allowed() {
        let cooldown = RenameCooldown::default();
        assert_eq!(cooldown.remaining(None, 0), None);
        assert_eq!(cooldown.remaining(None, i64::MAX), None);
    }

    #[test]
    fn test_boundary_at_window() {
        let cooldown = RenameCooldown::default();
        let t = 1_700_000_000;
        assert_eq!(cooldown.remaining(Some(t), t), Some(305));
        assert_eq!(cooldown.remaining(Some(t), t + 304), Some(1));
        assert_eq!(cooldown.remaining(Some(t), t + 305), None);
        assert_eq!(cooldown.remaining(Some(t), t + 10_000), None);
    }

    #[test]
    fn test_custom_window() {
        let cooldown = RenameCooldown::new(10);
        assert_eq!(cooldown.remaining(Some(100), 105), Some(5));
        assert_eq!(cooldown.remaining(Some(100), 110), None);
    }

    #[test]
    fn test_future_stamp_blocks_past_window() {
        // A stamp from the future (clock skew) blocks for longer than the window.
        let cooldown = RenameCooldown::default();
        assert_eq!(cooldown.remaining(Some(1_000), 900), Some(405));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        clock.set(1);
        assert_eq!(clock.now(), 1);
    }

    #[test]
    fn test_system_clock_is_recent() {
        assert!(SystemClock.now() > 1_600_000_000);
    }
}
