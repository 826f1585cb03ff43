#![no_std]
#![no_main]

mod board;
mod drivers;
mod tasks;
mod usb;

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use glider_core::config::{PRIMING_INTERVAL_MS, PRIMING_READS, STARTUP_SETTLE_MS};
use glider_core::{ControlConfig, GliderController, Primer};
use {defmt_rtt as _, panic_probe as _};

use crate::board::Board;
use crate::tasks::control_loop::{control_loop_task, Sonars, TelemetryChannel};
use crate::tasks::telemetry_task::telemetry_task;

// ── Inter-task channels ───────────────────────────────────────────────────────
//  Cap=1: the telemetry task only ever wants the latest frame.
static TELEMETRY_CHAN: TelemetryChannel = Channel::new();

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL, servos, sonars, USB)
    let Board {
        mut servos,
        right_sonar,
        height_sonar,
        mut led,
        usb_device,
        usb_serial,
    } = Board::init();
    let mut sonars = Sonars {
        right: right_sonar,
        height: height_sonar,
    };

    spawner.spawn(usb::usb_task(usb_device)).unwrap();
    spawner
        .spawn(telemetry_task(usb_serial, TELEMETRY_CHAN.receiver()))
        .unwrap();

    let config = ControlConfig::default();
    unwrap!(config.validate());

    // 2. Servos to neutral before anything moves
    servos.write_rudder(config.lateral.servo.neutral_us);
    servos.write_elevator(config.vertical.servo.neutral_us);

    // 3. Priming: a few paired reads to seed the distance filters
    info!("testing sensors...");
    let mut primer = Primer::new();
    for i in 0..PRIMING_READS {
        let right = sonars.right.measure().await;
        let height = sonars.height.measure().await;
        let accepted = primer.push(right, height);
        info!(
            "prime {}: right={} height={} accepted={}",
            i + 1,
            right,
            height,
            accepted
        );
        led.toggle();
        Timer::after(Duration::from_millis(PRIMING_INTERVAL_MS)).await;
    }

    let seed = primer.finish(config.failsafe_distance_cm);
    if seed.used_failsafe {
        warn!(
            "sensor init failed, using failsafe {} cm on both axes",
            config.failsafe_distance_cm
        );
    } else {
        info!(
            "sensor init ok ({} valid): right {} cm, height {} cm",
            seed.valid_reads, seed.right_cm, seed.height_cm
        );
    }
    led.set_high();

    let controller = GliderController::new(config, &seed);

    Timer::after(Duration::from_millis(STARTUP_SETTLE_MS)).await;
    info!("system ready, waiting for launch");

    // 4. Control loop owns sonars, servos and all control state from here on
    spawner
        .spawn(control_loop_task(
            sonars,
            servos,
            controller,
            &TELEMETRY_CHAN,
        ))
        .unwrap();

    // 5. Main task: LED heartbeat @ 1 Hz
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(500)).await;
    }
}
