//! Game clocks
//!
//! Game time is milliseconds since an epoch fixed on the first query. Clocks
//! are cheap to clone and share their epoch, so an input thread can stamp
//! commands on the same timeline as the game loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Source of monotonic game time
pub trait GameClock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock backed game time with a lazy epoch
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    epoch: Arc<OnceLock<Instant>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything has read the clock yet
    pub fn started(&self) -> bool {
        self.epoch.get().is_some()
    }
}

impl GameClock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let epoch = self.epoch.get_or_init(Instant::now);
        epoch.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and scripted runs
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Move to `ms`; earlier values are ignored so time never runs backwards
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl GameClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_epoch_is_lazy() {
        let clock = MonotonicClock::new();
        assert!(!clock.started());
        // A stall before the first query does not count
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.now_ms() < 30);
        assert!(clock.started());
    }

    #[test]
    fn test_monotonic_and_shared() {
        let clock = MonotonicClock::new();
        let other = clock.clone();
        let a = clock.now_ms();
        std::thread::sleep(Duration::from_millis(5));
        let b = other.now_ms();
        assert!(b >= a);
        assert!(b >= 5);
    }

    #[test]
    fn test_manual_clock_never_regresses() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(120);
        assert_eq!(clock.now_ms(), 150);
        clock.set(400);
        assert_eq!(clock.clone().now_ms(), 400);
    }
}
