use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pin, Pull, Speed};
use embassy_stm32::peripherals::{PB7, PC13, PC9, TIM3};
use embassy_stm32::rcc::*;
use embassy_stm32::time::{hz, Hertz as TimeHertz};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::{Channel, CountingMode};
use embassy_stm32::Config;

use crate::drivers::hcsr04::Hcsr04;
use crate::drivers::servo_pwm::ServoPwm;
use crate::usb::{self, UsbDevice, UsbSerial};

pub type RightSonar = Hcsr04<'static, PC9>;
pub type HeightSonar = Hcsr04<'static, PB7>;
pub type Servos = ServoPwm<'static, TIM3>;

/// Glider wiring on the JHEF405:
///
/// | Function        | Pin  | Resource        |
/// |-----------------|------|-----------------|
/// | Rudder servo    | PB0  | TIM3_CH3 (M1)   |
/// | Elevator servo  | PB1  | TIM3_CH4 (M2)   |
/// | Right sonar     | PC8 trig / PC9 echo | EXTI9 |
/// | Height sonar    | PB6 trig / PB7 echo | EXTI7 |
/// | Heartbeat LED   | PC13 |                 |
pub struct Board {
    pub servos: Servos,
    pub right_sonar: RightSonar,
    pub height_sonar: HeightSonar,
    pub led: Output<'static, PC13>,
    pub usb_device: UsbDevice,
    pub usb_serial: UsbSerial<'static>,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000), // Quartz 8MHz
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2), // 168 MHz
            divq: Some(PllQDiv::DIV7), // 48 MHz for USB
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        // Servo PWM @ 50 Hz on the first two motor pads
        let pwm = SimplePwm::new(
            p.TIM3,
            None,
            None,
            Some(PwmPin::new_ch3(p.PB0, OutputType::PushPull)),
            Some(PwmPin::new_ch4(p.PB1, OutputType::PushPull)),
            hz(50),
            CountingMode::EdgeAlignedUp,
        );
        let servos = ServoPwm::new(pwm, Channel::Ch3, Channel::Ch4);

        let right_sonar = Hcsr04::new(
            Output::new(p.PC8.degrade(), Level::Low, Speed::VeryHigh),
            ExtiInput::new(Input::new(p.PC9, Pull::Down), p.EXTI9),
        );
        let height_sonar = Hcsr04::new(
            Output::new(p.PB6.degrade(), Level::Low, Speed::VeryHigh),
            ExtiInput::new(Input::new(p.PB7, Pull::Down), p.EXTI7),
        );

        let led = Output::new(p.PC13, Level::High, Speed::Low);

        // USB CDC-ACM for the diagnostic stream
        let (usb_device, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);

        Self {
            servos,
            right_sonar,
            height_sonar,
            led,
            usb_device,
            usb_serial,
        }
    }
}
