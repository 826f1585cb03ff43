/// Fixed-period gate for a cooperative loop, in microseconds.
///
/// Deadlines stay on the `start + k·period` grid, so a wake that lands a
/// little late does not push the next deadline back. `dt` is the measured
/// time since the previous firing, which may be longer than the period when a
/// tick overran.
pub struct TickClock {
    period_us: u64,
    next_due_us: u64,
    last_us: u64,
}

impl TickClock {
    /// `start_us` is the reference instant of the first period.
    pub fn new(period_us: u64, start_us: u64) -> Self {
        let period_us = period_us.max(1);
        Self {
            period_us,
            next_due_us: start_us + period_us,
            last_us: start_us,
        }
    }

    pub fn from_millis(period_ms: u64, start_us: u64) -> Self {
        Self::new(period_ms * 1000, start_us)
    }

    /// Returns the elapsed seconds when a tick is due, `None` otherwise.
    pub fn poll(&mut self, now_us: u64) -> Option<f32> {
        if now_us < self.next_due_us {
            return None;
        }
        let elapsed = now_us - self.last_us;
        self.last_us = now_us;

        // Skip every deadline already passed, keeping the grid phase.
        let missed = (now_us - self.next_due_us) / self.period_us + 1;
        self.next_due_us += missed * self.period_us;

        Some(elapsed as f32 / 1_000_000.0)
    }

    pub fn last_us(&self) -> u64 {
        self.last_us
    }

    pub fn next_due_us(&self) -> u64 {
        self.next_due_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-6
    }

    #[test]
    fn fires_once_per_period() {
        let mut clock = TickClock::from_millis(50, 0);
        assert_eq!(clock.poll(10_000), None);
        assert_eq!(clock.poll(49_999), None);
        assert_eq!(clock.poll(50_000), Some(0.05));
        assert_eq!(clock.poll(60_000), None);
        assert_eq!(clock.last_us(), 50_000);
        assert_eq!(clock.next_due_us(), 100_000);
    }

    #[test]
    fn jittery_wakes_on_the_period_grid_all_fire() {
        let mut clock = TickClock::from_millis(50, 0);
        let wakes = [51_050, 100_970, 150_970, 200_970, 250_010, 300_000];
        let mut previous = 0;
        for now in wakes {
            let dt = clock.poll(now);
            assert!(dt.is_some(), "wake at {now} us was skipped");
            assert!(close(dt.unwrap(), (now - previous) as f32 / 1e6));
            previous = now;
        }
    }

    #[test]
    fn overrun_measures_dt_and_keeps_phase() {
        let mut clock = TickClock::from_millis(50, 1_000_000);
        assert!(close(clock.poll(1_063_000).unwrap(), 0.063));
        // The deadline stays on the grid rather than following the late wake.
        assert_eq!(clock.next_due_us(), 1_100_000);
        assert!(close(clock.poll(1_100_000).unwrap(), 0.037));
    }

    #[test]
    fn catch_up_wakes_after_long_overrun_are_ignored() {
        let mut clock = TickClock::from_millis(50, 0);
        assert!(close(clock.poll(130_000).unwrap(), 0.13));
        assert_eq!(clock.next_due_us(), 150_000);
        // Ticker catching up fires immediately for the missed 100 ms slot.
        assert_eq!(clock.poll(131_000), None);
        assert!(close(clock.poll(150_000).unwrap(), 0.02));
    }

    #[test]
    fn clock_going_backwards_does_not_fire() {
        let mut clock = TickClock::from_millis(50, 1_000_000);
        assert_eq!(clock.poll(900_000), None);
    }
}
