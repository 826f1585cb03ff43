#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightPhase {
    Grounded,
    Airborne,
}

/// One-shot latch: the glider counts as launched the first time its filtered
/// height exceeds the threshold, and never lands again as far as control is
/// concerned.
pub struct LaunchDetector {
    threshold_cm: f32,
    phase: FlightPhase,
    launched_at_ms: Option<u64>,
}

impl LaunchDetector {
    pub fn new(threshold_cm: f32) -> Self {
        Self {
            threshold_cm,
            phase: FlightPhase::Grounded,
            launched_at_ms: None,
        }
    }

    /// Returns `true` only on the tick that performs the transition.
    pub fn update(&mut self, height_cm: f32, now_ms: u64) -> bool {
        if self.phase == FlightPhase::Grounded && height_cm > self.threshold_cm {
            self.phase = FlightPhase::Airborne;
            self.launched_at_ms = Some(now_ms);
            return true;
        }
        false
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn is_airborne(&self) -> bool {
        self.phase == FlightPhase::Airborne
    }

    pub fn launched_at_ms(&self) -> Option<u64> {
        self.launched_at_ms
    }

    /// Time since launch, zero while grounded.
    pub fn flight_time_ms(&self, now_ms: u64) -> u64 {
        self.launched_at_ms.map_or(0, |t| now_ms.saturating_sub(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latches_once_above_threshold() {
        let mut launch = LaunchDetector::new(60.0);
        assert!(!launch.update(60.0, 100));
        assert_eq!(launch.phase(), FlightPhase::Grounded);
        assert_eq!(launch.flight_time_ms(150), 0);

        assert!(launch.update(60.5, 150));
        assert!(launch.is_airborne());
        assert_eq!(launch.launched_at_ms(), Some(150));

        // Dropping below the threshold again does not reset the latch.
        assert!(!launch.update(10.0, 200));
        assert!(!launch.update(90.0, 250));
        assert!(launch.is_airborne());
        assert_eq!(launch.flight_time_ms(1150), 1000);
    }
}
