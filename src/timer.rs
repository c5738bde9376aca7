use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Wall-clock source in milliseconds from an arbitrary epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock backed by `Instant`.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for deterministic tests.
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        self.current_ms.set(self.current_ms.get() + delta_ms);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Source of the once-per-second countdown tick. The session starts it when
/// typing begins and stops it when the session finishes.
pub trait TimerService {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Timer that only records start/stop; ticks are delivered by hand.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer {
    running: bool,
    starts: u32,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }
}

impl TimerService for ManualTimer {
    fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.starts += 1;
        }
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Seconds left on the clock, bonus time included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration_secs: u32,
    remaining_secs: u32,
    added_secs: u32,
}

impl Countdown {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            added_secs: 0,
        }
    }

    /// One second elapsed. Returns true when the clock hit zero.
    pub fn tick(&mut self) -> bool {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.is_expired()
    }

    pub fn add(&mut self, secs: u32) {
        self.remaining_secs += secs;
        self.added_secs += secs;
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Seconds consumed so far, counting bonus time as available time.
    pub fn consumed_secs(&self) -> u32 {
        (self.duration_secs + self.added_secs).saturating_sub(self.remaining_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_at_zero() {
        let mut countdown = Countdown::new(2);
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(countdown.tick());
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn bonus_extends_remaining_time() {
        let mut countdown = Countdown::new(10);
        countdown.tick();
        countdown.add(5);
        assert_eq!(countdown.remaining_secs(), 14);
        assert_eq!(countdown.consumed_secs(), 1);
    }

    #[test]
    fn mock_clock_advances() {
        let clock = Rc::new(MockClock::new());
        let shared: Rc<MockClock> = Rc::clone(&clock);
        clock.advance_secs(3);
        clock.advance_ms(250);
        assert_eq!(shared.now_ms(), 3250);
    }

    #[test]
    fn manual_timer_counts_distinct_starts() {
        let mut timer = ManualTimer::new();
        timer.start();
        timer.start();
        assert!(timer.is_running());
        assert_eq!(timer.starts(), 1);
        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
