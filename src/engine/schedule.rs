//! Periodic timers polled by the main loop.

use std::time::Duration;

/// Fixed-interval schedule. A due poll fires once and re-arms one interval later;
/// missed intervals are skipped rather than queued. A disarmed schedule never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    next_due: Option<Duration>,
}

impl Schedule {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Start firing one interval after `now`.
    pub fn arm(&mut self, now: Duration) {
        self.next_due = Some(now + self.interval);
    }

    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn poll(&mut self, now: Duration) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut s = Schedule::new(ms(100));
        s.arm(ms(0));
        assert!(!s.poll(ms(50)));
        assert!(s.poll(ms(100)));
        assert!(!s.poll(ms(150)));
        assert!(s.poll(ms(200)));
    }

    #[test]
    fn test_missed_ticks_are_not_queued() {
        let mut s = Schedule::new(ms(100));
        s.arm(ms(0));
        assert!(s.poll(ms(1000)));
        assert!(!s.poll(ms(1000)));
        assert!(!s.poll(ms(1099)));
        assert!(s.poll(ms(1100)));
    }

    #[test]
    fn test_disarmed_never_fires() {
        let mut s = Schedule::new(ms(100));
        assert!(!s.poll(ms(10_000)));
        s.arm(ms(0));
        s.disarm();
        assert!(!s.is_armed());
        assert!(!s.poll(ms(10_000)));
    }
}
