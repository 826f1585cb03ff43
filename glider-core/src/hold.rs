/// Per-axis state of the threshold-hold law.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoldState {
    Idle,
    /// Rate above threshold this tick.
    Active,
    /// Rate back below threshold, still inside the minimum dwell.
    Holding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Deflection {
    Neutral,
    Deflected,
}

/// Deflects while the closing rate is above `threshold` and keeps the
/// deflection for at least `hold_ms` after the last tick that was above it.
pub struct ThresholdHold {
    threshold_cm_s: f32,
    hold_ms: u64,
    state: HoldState,
    activated_at_ms: u64,
}

impl ThresholdHold {
    pub fn new(threshold_cm_s: f32, hold_ms: u64) -> Self {
        Self {
            threshold_cm_s,
            hold_ms,
            state: HoldState::Idle,
            activated_at_ms: 0,
        }
    }

    pub fn update(&mut self, rate_cm_s: f32, now_ms: u64) -> Deflection {
        if rate_cm_s > self.threshold_cm_s {
            self.state = HoldState::Active;
            self.activated_at_ms = now_ms;
            return Deflection::Deflected;
        }

        let held_for = now_ms.saturating_sub(self.activated_at_ms);
        if self.state != HoldState::Idle && held_for < self.hold_ms {
            self.state = HoldState::Holding;
            Deflection::Deflected
        } else {
            self.state = HoldState::Idle;
            Deflection::Neutral
        }
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn activated_at_ms(&self) -> Option<u64> {
        match self.state {
            HoldState::Idle => None,
            _ => Some(self.activated_at_ms),
        }
    }
}
