use defmt::{debug, info};
use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Ticker};
use glider_core::{GliderController, TelemetryFrame, TickClock};

use crate::board::{HeightSonar, RightSonar, Servos};

/// Holds at most one frame. A newer frame replaces one the telemetry task has
/// not picked up yet.
pub type TelemetryChannel = Channel<CriticalSectionRawMutex, TelemetryFrame, 1>;

pub struct Sonars {
    pub right: RightSonar,
    pub height: HeightSonar,
}

// ── Task ─────────────────────────────────────────────────────────────────────

/// Control loop, 20 Hz nominal.
///
/// Both sonar reads happen inside the tick and can take up to 30 ms each, so
/// the real cadence drifts below 20 Hz. The ticker wakes the task and the
/// `TickClock` drops catch-up wakes after an overrun. `dt` is measured in
/// microseconds from `Instant`.
#[task]
pub async fn control_loop_task(
    mut sonars: Sonars,
    mut servos: Servos,
    mut controller: GliderController,
    telemetry: &'static TelemetryChannel,
) {
    let period_ms = controller.config().period_ms;
    let log_interval_ms = controller.config().log_interval_ms;

    // ── Timing ────────────────────────────────────────────────────────────────
    let start = Instant::now().as_micros();
    let mut clock = TickClock::from_millis(period_ms, start);
    let mut log_gate = TickClock::from_millis(log_interval_ms, start);
    let mut ticker = Ticker::every(Duration::from_millis(period_ms));

    loop {
        ticker.next().await;

        // A ticker catching up after an overrun can wake us early.
        let now_us = Instant::now().as_micros();
        let Some(dt) = clock.poll(now_us) else {
            continue;
        };

        // ── A. Sense (sequential, each bounded by the echo timeout) ──────────
        let right = sonars.right.measure().await;
        let height = sonars.height.measure().await;

        // ── B. Filter → launch → rate → threshold-hold → smoothing ───────────
        let now = now_us / 1000;
        let report = controller.tick(now, dt, right, height);
        if report.launched {
            info!(
                "launch detected at {} ms, height {} cm",
                now, report.vertical.distance_cm
            );
        }

        // ── C. Actuate (deadband already applied) ────────────────────────────
        if let Some(us) = report.lateral.write_us {
            servos.write_rudder(us);
        }
        if let Some(us) = report.vertical.write_us {
            servos.write_elevator(us);
        }

        // ── D. Diagnostics @ 5 Hz ─────────────────────────────────────────────
        if log_gate.poll(now_us).is_some() {
            debug!("dt={} report={}", dt, report);
            publish_latest(telemetry, controller.telemetry(&report));
        }
    }
}

/// Non-blocking send that evicts a stale frame when USB is slower than 5 Hz.
fn publish_latest(channel: &TelemetryChannel, frame: TelemetryFrame) {
    if channel.try_send(frame).is_err() {
        let _ = channel.try_receive();
        let _ = channel.try_send(frame);
    }
}
