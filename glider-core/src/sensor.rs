use crate::config::{SONAR_TIMEOUT_US, SPEED_OF_SOUND_DIVISOR};

/// One range reading from an ultrasonic sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceSample {
    Cm(f32),
    /// The echo never came back inside the timeout.
    NoReading,
}

impl DistanceSample {
    /// Converts a measured echo pulse width. A zero width or one past the
    /// timeout is a missed echo.
    pub fn from_echo_us(duration_us: u32) -> Self {
        if duration_us == 0 || duration_us > SONAR_TIMEOUT_US {
            Self::NoReading
        } else {
            Self::Cm(duration_us as f32 / SPEED_OF_SOUND_DIVISOR)
        }
    }

    pub fn cm(self) -> Option<f32> {
        match self {
            Self::Cm(cm) => Some(cm),
            Self::NoReading => None,
        }
    }

    /// A reading that can seed a filter: present and strictly positive.
    pub fn positive(self) -> Option<f32> {
        self.cm().filter(|cm| *cm > 0.0)
    }
}

/// Outcome of the startup priming reads.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrimingResult {
    pub right_cm: f32,
    pub height_cm: f32,
    pub valid_reads: usize,
    pub used_failsafe: bool,
}

/// Averages paired startup reads. A pair only counts when both sensors
/// answered with a positive distance.
#[derive(Default)]
pub struct Primer {
    sum_right: f32,
    sum_height: f32,
    valid: usize,
    taken: usize,
}

impl Primer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the pair was accepted.
    pub fn push(&mut self, right: DistanceSample, height: DistanceSample) -> bool {
        self.taken += 1;
        match (right.positive(), height.positive()) {
            (Some(r), Some(h)) => {
                self.sum_right += r;
                self.sum_height += h;
                self.valid += 1;
                true
            }
            _ => false,
        }
    }

    pub fn taken(&self) -> usize {
        self.taken
    }

    pub fn finish(&self, failsafe_cm: f32) -> PrimingResult {
        if self.valid == 0 {
            return PrimingResult {
                right_cm: failsafe_cm,
                height_cm: failsafe_cm,
                valid_reads: 0,
                used_failsafe: true,
            };
        }
        let n = self.valid as f32;
        PrimingResult {
            right_cm: self.sum_right / n,
            height_cm: self.sum_height / n,
            valid_reads: self.valid,
            used_failsafe: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_width_converts_to_centimetres() {
        assert_eq!(DistanceSample::from_echo_us(5800), DistanceSample::Cm(100.0));
        assert_eq!(DistanceSample::from_echo_us(0), DistanceSample::NoReading);
        assert_eq!(DistanceSample::from_echo_us(30_001), DistanceSample::NoReading);
        assert!(DistanceSample::from_echo_us(30_000).cm().is_some());
    }

    #[test]
    fn primer_averages_valid_pairs_only() {
        let mut primer = Primer::new();
        assert!(primer.push(DistanceSample::Cm(100.0), DistanceSample::Cm(20.0)));
        assert!(!primer.push(DistanceSample::NoReading, DistanceSample::Cm(90.0)));
        assert!(!primer.push(DistanceSample::Cm(50.0), DistanceSample::Cm(0.0)));
        assert!(primer.push(DistanceSample::Cm(120.0), DistanceSample::Cm(30.0)));

        let seed = primer.finish(50.0);
        assert_eq!(primer.taken(), 4);
        assert_eq!(seed.valid_reads, 2);
        assert!(!seed.used_failsafe);
        assert_eq!(seed.right_cm, 110.0);
        assert_eq!(seed.height_cm, 25.0);
    }

    #[test]
    fn primer_falls_back_to_failsafe() {
        let mut primer = Primer::new();
        for _ in 0..5 {
            primer.push(DistanceSample::NoReading, DistanceSample::NoReading);
        }
        let seed = primer.finish(50.0);
        assert!(seed.used_failsafe);
        assert_eq!(seed.right_cm, 50.0);
        assert_eq!(seed.height_cm, 50.0);
    }
}
