use core::fmt;

use crate::hold::Deflection;

// ── Sensor physics ────────────────────────────────────────────────────────────

/// Echo pulse width (µs) per centimetre of range, round trip.
pub const SPEED_OF_SOUND_DIVISOR: f32 = 58.0;
/// Echo timeout. 30 ms is roughly 400 cm of range.
pub const SONAR_TIMEOUT_US: u32 = 30_000;

// ── Filtering ─────────────────────────────────────────────────────────────────

pub const DIST_FILTER_ALPHA: f32 = 0.50;
/// Larger jumps between two readings are treated as noise spikes.
pub const MAX_DIST_JUMP_CM: f32 = 60.0;
/// Seed used when no priming read succeeds.
pub const FAILSAFE_DIST_CM: f32 = 50.0;
pub const PRIMING_READS: usize = 5;
pub const PRIMING_INTERVAL_MS: u64 = 20;
/// Pause between priming and the first control tick.
pub const STARTUP_SETTLE_MS: u64 = 1000;

// ── Rate estimation ───────────────────────────────────────────────────────────

pub const MAX_PHYSICAL_RATE_CM_S: f32 = 200.0;
/// Number of raw rates averaged into the reported rate.
pub const RATE_WINDOW: usize = 3;

// ── Control law ───────────────────────────────────────────────────────────────

pub const RATE_RIGHT_THRESHOLD_CM_S: f32 = 50.0;
pub const RATE_HEIGHT_THRESHOLD_CM_S: f32 = 50.0;
pub const SERVO_HOLD_MS: u64 = 500;
pub const LAUNCH_HEIGHT_CM: f32 = 60.0;

// ── Servo output ──────────────────────────────────────────────────────────────

pub const SERVO_SMOOTHING_ALPHA: f32 = 0.70;
pub const SERVO_DEADBAND_US: u16 = 300;

// ── Timing ────────────────────────────────────────────────────────────────────

/// 20 Hz control loop.
pub const LOOP_PERIOD_MS: u64 = 50;
/// 5 Hz diagnostic line.
pub const LOG_INTERVAL_MS: u64 = 200;

/// Pulse-width calibration of one servo, in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoCalibration {
    pub min_us: u16,
    pub max_us: u16,
    pub neutral_us: u16,
    pub deflected_us: u16,
}

impl ServoCalibration {
    /// Rudder deflects left, away from the right-hand wall.
    pub const RUDDER: Self = Self {
        min_us: 900,
        max_us: 2100,
        neutral_us: 1700,
        deflected_us: 900,
    };

    /// Elevator deflects up, away from the ground.
    pub const ELEVATOR: Self = Self {
        min_us: 900,
        max_us: 2100,
        neutral_us: 1100,
        deflected_us: 2100,
    };

    pub fn clamp(&self, us: u16) -> u16 {
        us.max(self.min_us).min(self.max_us)
    }

    pub fn setpoint(&self, deflection: Deflection) -> u16 {
        match deflection {
            Deflection::Neutral => self.neutral_us,
            Deflection::Deflected => self.deflected_us,
        }
    }
}

/// Hard limit on a single raw rate sample. A sample beyond the limit is
/// replaced by zero. Off in the flight configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateClamp {
    pub enabled: bool,
    pub max_rate_cm_s: f32,
}

impl Default for RateClamp {
    fn default() -> Self {
        Self {
            enabled: false,
            max_rate_cm_s: MAX_PHYSICAL_RATE_CM_S,
        }
    }
}

/// One sensor → servo axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisConfig {
    /// Closing rate above which the servo deflects.
    pub threshold_cm_s: f32,
    pub servo: ServoCalibration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    pub filter_alpha: f32,
    pub max_jump_cm: f32,
    pub failsafe_distance_cm: f32,
    pub rate_clamp: RateClamp,
    pub launch_height_cm: f32,
    pub hold_ms: u64,
    pub servo_alpha: f32,
    pub servo_deadband_us: u16,
    pub period_ms: u64,
    pub log_interval_ms: u64,
    /// Right-hand wall sensor driving the rudder.
    pub lateral: AxisConfig,
    /// Height sensor driving the elevator.
    pub vertical: AxisConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            filter_alpha: DIST_FILTER_ALPHA,
            max_jump_cm: MAX_DIST_JUMP_CM,
            failsafe_distance_cm: FAILSAFE_DIST_CM,
            rate_clamp: RateClamp::default(),
            launch_height_cm: LAUNCH_HEIGHT_CM,
            hold_ms: SERVO_HOLD_MS,
            servo_alpha: SERVO_SMOOTHING_ALPHA,
            servo_deadband_us: SERVO_DEADBAND_US,
            period_ms: LOOP_PERIOD_MS,
            log_interval_ms: LOG_INTERVAL_MS,
            lateral: AxisConfig {
                threshold_cm_s: RATE_RIGHT_THRESHOLD_CM_S,
                servo: ServoCalibration::RUDDER,
            },
            vertical: AxisConfig {
                threshold_cm_s: RATE_HEIGHT_THRESHOLD_CM_S,
                servo: ServoCalibration::ELEVATOR,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A smoothing factor outside (0, 1].
    SmoothingFactor,
    /// Spike threshold or failsafe distance not strictly positive.
    Distance,
    /// Zero control period or log interval.
    Period,
    /// Servo range inverted or a setpoint outside it.
    ServoRange,
    /// Rate clamp enabled with a non-positive limit.
    RateClamp,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::SmoothingFactor => "smoothing factor must be in (0, 1]",
            Self::Distance => "distance limits must be positive",
            Self::Period => "periods must be non-zero",
            Self::ServoRange => "servo setpoints must lie inside min..=max",
            Self::RateClamp => "rate clamp limit must be positive",
        };
        f.write_str(msg)
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for alpha in [self.filter_alpha, self.servo_alpha] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(ConfigError::SmoothingFactor);
            }
        }
        if !(self.max_jump_cm > 0.0 && self.failsafe_distance_cm > 0.0) {
            return Err(ConfigError::Distance);
        }
        if self.period_ms == 0 || self.log_interval_ms == 0 {
            return Err(ConfigError::Period);
        }
        if self.rate_clamp.enabled && !(self.rate_clamp.max_rate_cm_s > 0.0) {
            return Err(ConfigError::RateClamp);
        }
        for servo in [self.lateral.servo, self.vertical.servo] {
            let inside = |us: u16| (servo.min_us..=servo.max_us).contains(&us);
            if servo.min_us > servo.max_us
                || !inside(servo.neutral_us)
                || !inside(servo.deflected_us)
            {
                return Err(ConfigError::ServoRange);
            }
        }
        Ok(())
    }
}
