use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::{CaptureCompare16bitInstance, Channel};

/// One 50 Hz servo frame.
pub const SERVO_FRAME_US: u32 = 20_000;

/// Rudder and elevator servos sharing one 50 Hz timer.
pub struct ServoPwm<'d, T: CaptureCompare16bitInstance> {
    pwm: SimplePwm<'d, T>,
    rudder: Channel,
    elevator: Channel,
}

impl<'d, T: CaptureCompare16bitInstance> ServoPwm<'d, T> {
    pub fn new(mut pwm: SimplePwm<'d, T>, rudder: Channel, elevator: Channel) -> Self {
        pwm.enable(rudder);
        pwm.enable(elevator);
        Self {
            pwm,
            rudder,
            elevator,
        }
    }

    pub fn write_rudder(&mut self, pulse_us: u16) {
        self.write(self.rudder, pulse_us);
    }

    pub fn write_elevator(&mut self, pulse_us: u16) {
        self.write(self.elevator, pulse_us);
    }

    fn write(&mut self, channel: Channel, pulse_us: u16) {
        let max_duty = self.pwm.get_max_duty() as u32;
        let duty = (pulse_us as u32).min(SERVO_FRAME_US) * max_duty / SERVO_FRAME_US;
        self.pwm.set_duty(channel, duty as u16);
    }
}
