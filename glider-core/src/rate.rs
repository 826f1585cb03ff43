use heapless::Deque;
use micromath::F32Ext;

use crate::config::{RateClamp, RATE_WINDOW};

/// Trailing mean over the last `N` values with an O(1) running sum.
///
/// Until the window has filled the mean is taken over the values seen so far.
pub struct RollingAverage<const N: usize> {
    window: Deque<f32, N>,
    sum: f32,
}

impl<const N: usize> Default for RollingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RollingAverage<N> {
    pub fn new() -> Self {
        Self {
            window: Deque::new(),
            sum: 0.0,
        }
    }

    /// Pushes `value`, evicting the oldest entry once full, and returns the
    /// new mean.
    pub fn add(&mut self, value: f32) -> f32 {
        if self.window.is_full() {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
        if self.window.push_back(value).is_ok() {
            self.sum += value;
        }
        self.average()
    }

    pub fn average(&self) -> f32 {
        if self.window.is_empty() {
            0.0
        } else {
            self.sum / self.window.len() as f32
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn sum(&self) -> f32 {
        self.sum
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.window.iter()
    }
}

/// Closing rate in cm/s: positive while the distance shrinks.
pub fn closing_rate(current_cm: f32, previous_cm: f32, dt_s: f32) -> f32 {
    if dt_s <= 0.0 {
        return 0.0;
    }
    -(current_cm - previous_cm) / dt_s
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateSample {
    pub raw_cm_s: f32,
    pub smoothed_cm_s: f32,
}

/// Differentiates one filtered distance per tick and smooths the result.
pub struct RateEstimator {
    previous_cm: f32,
    average: RollingAverage<RATE_WINDOW>,
    clamp: RateClamp,
}

impl RateEstimator {
    pub fn new(seed_cm: f32, clamp: RateClamp) -> Self {
        Self {
            previous_cm: seed_cm,
            average: RollingAverage::new(),
            clamp,
        }
    }

    /// Moves the differentiation origin without touching the average.
    pub fn reseed(&mut self, current_cm: f32) {
        self.previous_cm = current_cm;
    }

    pub fn estimate(&mut self, current_cm: f32, dt_s: f32) -> RateSample {
        let mut raw = closing_rate(current_cm, self.previous_cm, dt_s);
        if self.clamp.enabled && raw.abs() > self.clamp.max_rate_cm_s {
            raw = 0.0;
        }
        let smoothed = self.average.add(raw);
        self.previous_cm = current_cm;
        RateSample {
            raw_cm_s: raw,
            smoothed_cm_s: smoothed,
        }
    }

    pub fn previous_cm(&self) -> f32 {
        self.previous_cm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-2
    }

    #[test]
    fn partial_window_divides_by_count() {
        let mut avg = RollingAverage::<3>::new();
        assert_eq!(avg.add(30.0), 30.0);
        assert_eq!(avg.add(60.0), 45.0);
        assert_eq!(avg.add(90.0), 60.0);
        assert_eq!(avg.add(0.0), 50.0);
        assert_eq!(avg.len(), 3);
    }

    #[test]
    fn rate_sign_is_closing() {
        assert_eq!(closing_rate(96.0, 100.0, 0.05), 80.0);
        assert_eq!(closing_rate(104.0, 100.0, 0.05), -80.0);
        assert_eq!(closing_rate(90.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn constant_distance_gives_zero_rate() {
        let mut est = RateEstimator::new(120.0, RateClamp::default());
        for _ in 0..10 {
            let s = est.estimate(120.0, 0.05);
            assert_eq!(s.raw_cm_s, 0.0);
            assert_eq!(s.smoothed_cm_s, 0.0);
        }
    }

    #[test]
    fn clamp_is_inactive_by_default() {
        let mut est = RateEstimator::new(100.0, RateClamp::default());
        let s = est.estimate(80.0, 0.05);
        assert_eq!(s.raw_cm_s, 400.0);
        assert_eq!(est.previous_cm(), 80.0);
    }

    #[test]
    fn enabled_clamp_zeroes_implausible_rates() {
        let clamp = RateClamp {
            enabled: true,
            max_rate_cm_s: 200.0,
        };
        let mut est = RateEstimator::new(100.0, clamp);
        assert_eq!(est.estimate(80.0, 0.05).raw_cm_s, 0.0);
        assert_eq!(est.estimate(75.0, 0.05).raw_cm_s, 100.0);
    }

    #[test]
    fn reseed_moves_origin() {
        let mut est = RateEstimator::new(40.0, RateClamp::default());
        est.reseed(75.0);
        let s = est.estimate(75.0, 0.05);
        assert_eq!(s.raw_cm_s, 0.0);
    }

    proptest! {
        #[test]
        fn full_window_is_mean_of_last_three(
            values in proptest::collection::vec(-500.0f32..500.0, 3..40),
        ) {
            let mut avg = RollingAverage::<3>::new();
            let mut reported = 0.0;
            for v in &values {
                reported = avg.add(*v);
            }
            let tail = &values[values.len() - 3..];
            let expected = tail.iter().sum::<f32>() / 3.0;
            prop_assert!(close(reported, expected), "{} vs {}", reported, expected);
        }

        #[test]
        fn running_sum_tracks_window(
            values in proptest::collection::vec(-500.0f32..500.0, 0..40),
        ) {
            let mut avg = RollingAverage::<3>::new();
            for v in &values {
                avg.add(*v);
                let direct: f32 = avg.iter().sum();
                prop_assert!(close(avg.sum(), direct));
            }
        }
    }
}
