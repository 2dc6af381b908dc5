use std::time::{Duration, Instant};

/// Fixed-period tick source for the main loop.
///
/// Deadlines are computed from the start instant rather than from the
/// previous tick, so a slow frame doesn't shift every later one.
#[derive(Debug, Clone)]
pub struct FrameClock {
    period: Duration,
    started: Instant,
    frames: u64,
}

impl FrameClock {
    pub fn new(frame_rate: u32) -> Self {
        Self::starting_at(frame_rate, Instant::now())
    }

    pub fn starting_at(frame_rate: u32, started: Instant) -> Self {
        Self {
            period: Duration::from_secs(1) / frame_rate.max(1),
            started,
            frames: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks taken so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Instant at which the next tick is due.
    pub fn next_deadline(&self) -> Instant {
        self.started + self.period * (self.frames + 1).min(u32::MAX as u64) as u32
    }

    /// Time left until the next tick, zero if it is already due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_deadline().saturating_duration_since(now)
    }

    /// Advances to the next frame and returns its number.
    pub fn tick(&mut self) -> u64 {
        self.frames += 1;
        self.frames
    }

    /// Blocks the calling thread until the next deadline, then ticks.
    pub fn wait_and_tick(&mut self) -> u64 {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadlines_advance_by_period() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(50, start);
        assert_eq!(clock.period(), Duration::from_millis(20));
        assert_eq!(clock.next_deadline(), start + Duration::from_millis(20));

        clock.tick();
        clock.tick();
        assert_eq!(clock.frames(), 2);
        assert_eq!(clock.next_deadline(), start + Duration::from_millis(60));
    }

    #[test]
    fn remaining_saturates() {
        let start = Instant::now();
        let clock = FrameClock::starting_at(10, start);
        assert_eq!(
            clock.remaining(start + Duration::from_secs(5)),
            Duration::ZERO
        );
        assert_eq!(clock.remaining(start), Duration::from_millis(100));
    }

    #[test]
    fn zero_rate_is_treated_as_one() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.period(), Duration::from_secs(1));
    }
}
