use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use glider_core::TelemetryFrame;

use crate::usb::{self, UsbSerial};

const USB_DEBUG_ENABLED: bool = true;

/// Telemetry task: prints every frame the control loop publishes (5 Hz) as
/// one text line on the USB serial port.
#[task]
pub async fn telemetry_task(
    mut usb_serial: UsbSerial<'static>,
    frame_rx: Receiver<'static, CriticalSectionRawMutex, TelemetryFrame, 1>,
) {
    loop {
        let frame = frame_rx.receive().await;

        // Nobody listening: drop the line rather than stall on the endpoint
        if !USB_DEBUG_ENABLED || !usb_serial.dtr() {
            continue;
        }

        let line = frame.to_line();
        let _ = usb::write_line(&mut usb_serial, line.as_bytes()).await;
    }
}
