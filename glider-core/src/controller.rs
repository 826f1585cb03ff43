//! The per-tick pipeline: filter → launch latch → rate → threshold-hold →
//! servo output, for the lateral (rudder) and vertical (elevator) axes.

use crate::config::{AxisConfig, ControlConfig};
use crate::filter::DistanceFilter;
use crate::hold::{Deflection, HoldState, ThresholdHold};
use crate::launch::{FlightPhase, LaunchDetector};
use crate::rate::{RateEstimator, RateSample};
use crate::sensor::{DistanceSample, PrimingResult};
use crate::servo::ServoChannel;
use crate::telemetry::TelemetryFrame;


/// What one axis did during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisReport {
    pub distance_cm: f32,
    pub rate: RateSample,
    pub state: HoldState,
    /// Setpoint chosen by the control law, before smoothing.
    pub target_us: u16,
    /// Smoothed command after this tick.
    pub command_us: u16,
    /// Pulse width to send to the servo this tick, if any.
    pub write_us: Option<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub now_ms: u64,
    pub phase: FlightPhase,
    /// Set on the single tick where launch was detected.
    pub launched: bool,
    pub lateral: AxisReport,
    pub vertical: AxisReport,
}

struct Axis {
    filter: DistanceFilter,
    rate: RateEstimator,
    hold: ThresholdHold,
    servo: ServoChannel,
}

impl Axis {
    fn new(axis: &AxisConfig, config: &ControlConfig, seed_cm: f32) -> Self {
        Self {
            filter: DistanceFilter::new(config.filter_alpha, config.max_jump_cm, seed_cm),
            rate: RateEstimator::new(seed_cm, config.rate_clamp),
            hold: ThresholdHold::new(axis.threshold_cm_s, config.hold_ms),
            servo: ServoChannel::new(axis.servo, config.servo_alpha, config.servo_deadband_us),
        }
    }

    fn control(&mut self, distance_cm: f32, airborne: bool, now_ms: u64, dt_s: f32) -> AxisReport {
        let (rate, deflection) = if airborne {
            let rate = self.rate.estimate(distance_cm, dt_s);
            (rate, self.hold.update(rate.smoothed_cm_s, now_ms))
        } else {
            (RateSample::default(), Deflection::Neutral)
        };

        let target_us = self.servo.calibration().setpoint(deflection);
        let write_us = self.servo.advance(target_us);

        AxisReport {
            distance_cm,
            rate,
            state: self.hold.state(),
            target_us,
            command_us: self.servo.smoothed_us(),
            write_us,
        }
    }
}

/// Owns every piece of control state. One instance lives in the control task.
pub struct GliderController {
    config: ControlConfig,
    launch: LaunchDetector,
    lateral: Axis,
    vertical: Axis,
}

impl GliderController {
    pub fn new(config: ControlConfig, seed: &PrimingResult) -> Self {
        Self {
            launch: LaunchDetector::new(config.launch_height_cm),
            lateral: Axis::new(&config.lateral, &config, seed.right_cm),
            vertical: Axis::new(&config.vertical, &config, seed.height_cm),
            config,
        }
    }

    /// Runs one control tick. `dt_s` is the measured time since the previous
    /// tick.
    pub fn tick(
        &mut self,
        now_ms: u64,
        dt_s: f32,
        right: DistanceSample,
        height: DistanceSample,
    ) -> TickReport {
        let right_cm = self.lateral.filter.update(right);
        let height_cm = self.vertical.filter.update(height);

        let launched = self.launch.update(height_cm, now_ms);
        if launched {
            // Differentiate from here, not from the pre-launch seed.
            self.lateral.rate.reseed(right_cm);
            self.vertical.rate.reseed(height_cm);
        }

        let airborne = self.launch.is_airborne();
        TickReport {
            now_ms,
            phase: self.launch.phase(),
            launched,
            lateral: self.lateral.control(right_cm, airborne, now_ms, dt_s),
            vertical: self.vertical.control(height_cm, airborne, now_ms, dt_s),
        }
    }

    pub fn telemetry(&self, report: &TickReport) -> TelemetryFrame {
        TelemetryFrame {
            flight_time_s: self.launch.flight_time_ms(report.now_ms) as f32 / 1000.0,
            right_cm: report.lateral.distance_cm,
            height_cm: report.vertical.distance_cm,
            rate_right_cm_s: report.lateral.rate.smoothed_cm_s,
            rate_height_cm_s: report.vertical.rate.smoothed_cm_s,
            rudder_us: report.lateral.command_us,
            elevator_us: report.vertical.command_us,
        }
    }

    /// Rudder and elevator pulse widths for the power-up neutral position.
    pub fn neutral_pulses(&self) -> (u16, u16) {
        (
            self.config.lateral.servo.neutral_us,
            self.config.vertical.servo.neutral_us,
        )
    }

    pub fn phase(&self) -> FlightPhase {
        self.launch.phase()
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }
}
