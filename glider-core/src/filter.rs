use micromath::F32Ext;

use crate::sensor::DistanceSample;

/// One step of the distance filter: dropouts and spikes keep `previous`,
/// anything else is blended in with weight `alpha`.
pub fn filter_distance(raw: DistanceSample, previous: f32, alpha: f32, max_jump_cm: f32) -> f32 {
    match raw {
        DistanceSample::NoReading => previous,
        DistanceSample::Cm(cm) if (cm - previous).abs() > max_jump_cm => previous,
        DistanceSample::Cm(cm) => alpha * cm + (1.0 - alpha) * previous,
    }
}

/// Per-sensor filtered distance. Always holds the last accepted estimate.
pub struct DistanceFilter {
    alpha: f32,
    max_jump_cm: f32,
    value_cm: f32,
}

impl DistanceFilter {
    pub fn new(alpha: f32, max_jump_cm: f32, seed_cm: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            max_jump_cm,
            value_cm: seed_cm,
        }
    }

    pub fn update(&mut self, raw: DistanceSample) -> f32 {
        self.value_cm = filter_distance(raw, self.value_cm, self.alpha, self.max_jump_cm);
        self.value_cm
    }

    pub fn value(&self) -> f32 {
        self.value_cm
    }
}
