use micromath::F32Ext;

use crate::config::ServoCalibration;

/// One exponential step from `previous_us` toward `target_us`, rounded to the
/// nearest microsecond so a constant target is reached exactly.
pub fn smooth_toward(target_us: u16, previous_us: u16, alpha: f32) -> u16 {
    let blended = alpha * target_us as f32 + (1.0 - alpha) * previous_us as f32;
    blended.round() as u16
}

/// Output stage of one servo: clamp, smooth, and only emit a write when the
/// smoothed command has moved further than the deadband from what the
/// hardware last received.
pub struct ServoChannel {
    calibration: ServoCalibration,
    alpha: f32,
    deadband_us: u16,
    smoothed_us: u16,
    last_written_us: Option<u16>,
}

impl ServoChannel {
    pub fn new(calibration: ServoCalibration, alpha: f32, deadband_us: u16) -> Self {
        Self {
            calibration,
            alpha: alpha.clamp(0.0, 1.0),
            deadband_us,
            smoothed_us: calibration.clamp(calibration.neutral_us),
            last_written_us: None,
        }
    }

    /// Advances one tick toward `target_us`. Returns the pulse width to write,
    /// if any.
    pub fn advance(&mut self, target_us: u16) -> Option<u16> {
        let target = self.calibration.clamp(target_us);
        self.smoothed_us = self
            .calibration
            .clamp(smooth_toward(target, self.smoothed_us, self.alpha));

        let moved = match self.last_written_us {
            Some(last) => {
                (self.smoothed_us as i32 - last as i32).unsigned_abs() > self.deadband_us as u32
            }
            None => true,
        };
        if moved {
            self.last_written_us = Some(self.smoothed_us);
            Some(self.smoothed_us)
        } else {
            None
        }
    }

    pub fn smoothed_us(&self) -> u16 {
        self.smoothed_us
    }

    pub fn last_written_us(&self) -> Option<u16> {
        self.last_written_us
    }

    pub fn calibration(&self) -> &ServoCalibration {
        &self.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rudder() -> ServoChannel {
        ServoChannel::new(ServoCalibration::RUDDER, 0.7, 300)
    }

    #[test]
    fn first_advance_always_writes() {
        let mut servo = rudder();
        assert_eq!(servo.advance(1700), Some(1700));
        assert_eq!(servo.advance(1700), None);
    }

    #[test]
    fn converges_onto_deflection() {
        let mut servo = rudder();

        let mut smoothed = [0u16; 8];
        let mut writes = 0;
        for slot in smoothed.iter_mut() {
            if servo.advance(900).is_some() {
                writes += 1;
            }
            *slot = servo.smoothed_us();
        }
        assert_eq!(smoothed, [1140, 972, 922, 907, 902, 901, 900, 900]);
        // Nothing has been written yet, so the first step always goes out;
        // none of the later steps clear the deadband from there.
        assert_eq!(writes, 1);
        assert_eq!(servo.last_written_us(), Some(1140));
    }

    #[test]
    fn target_is_clamped_before_smoothing() {
        let mut servo = ServoChannel::new(ServoCalibration::ELEVATOR, 1.0, 0);
        assert_eq!(servo.advance(3000), Some(2100));
        assert_eq!(servo.advance(0), Some(900));
    }

    proptest! {
        #[test]
        fn steady_state_is_idempotent(target in 900u16..=2100, ticks in 1usize..20) {
            let mut servo = rudder();
            for _ in 0..40 {
                servo.advance(target);
            }
            prop_assert_eq!(servo.smoothed_us(), target);
            for _ in 0..ticks {
                servo.advance(target);
                prop_assert_eq!(servo.smoothed_us(), target);
            }
        }

        #[test]
        fn deadband_decides_every_write(start in 900u16..=2100, target in 900u16..=2100) {
            let mut servo = ServoChannel::new(ServoCalibration::RUDDER, 1.0, 300);
            servo.advance(start);
            let wrote = servo.advance(target);
            let delta = (target as i32 - start as i32).abs();
            if delta > 300 {
                prop_assert_eq!(wrote, Some(target));
                prop_assert_eq!(servo.last_written_us(), Some(target));
            } else {
                prop_assert_eq!(wrote, None);
                prop_assert_eq!(servo.last_written_us(), Some(start));
            }
        }

        #[test]
        fn smoothed_stays_in_calibration(targets in proptest::collection::vec(0u16..4000, 1..50)) {
            let mut servo = rudder();
            for t in targets {
                servo.advance(t);
                let us = servo.smoothed_us();
                prop_assert!((900..=2100).contains(&us));
            }
        }
    }
}
