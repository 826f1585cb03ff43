//! Control core of the wall-following glider.
//!
//! Everything here is `no_std`, allocation free and driven by plain numbers
//! (milliseconds, centimetres, microseconds), so the same code runs inside the
//! embassy firmware and under `cargo test` on the host.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod controller;
pub mod filter;
pub mod hold;
pub mod launch;
pub mod rate;
pub mod schedule;
pub mod sensor;
pub mod servo;
pub mod telemetry;

pub use config::{AxisConfig, ConfigError, ControlConfig, RateClamp, ServoCalibration};
pub use controller::{AxisReport, GliderController, TickReport};
pub use filter::{filter_distance, DistanceFilter};
pub use hold::{Deflection, HoldState, ThresholdHold};
pub use launch::{FlightPhase, LaunchDetector};
pub use rate::{closing_rate, RateEstimator, RateSample, RollingAverage};
pub use schedule::TickClock;
pub use sensor::{DistanceSample, Primer, PrimingResult};
pub use servo::{smooth_toward, ServoChannel};
pub use telemetry::{TelemetryFrame, TelemetryLine};
