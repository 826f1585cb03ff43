use embassy_futures::select::{select, Either};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Output, Pin};
use embassy_time::{block_for, Duration, Instant, Timer};
use glider_core::config::SONAR_TIMEOUT_US;
use glider_core::DistanceSample;

/// HC-SR04 ultrasonic ranger: trigger on a push-pull output, echo on an
/// EXTI-capable input.
pub struct Hcsr04<'d, E: Pin> {
    trigger: Output<'d, AnyPin>,
    echo: ExtiInput<'d, E>,
}

impl<'d, E: Pin> Hcsr04<'d, E> {
    const TRIG_SETTLE_US: u64 = 2;
    const TRIG_PULSE_US: u64 = 10;

    pub fn new(trigger: Output<'d, AnyPin>, echo: ExtiInput<'d, E>) -> Self {
        Self { trigger, echo }
    }

    /// Fires one ping and times the echo. Blocks the task for at most the
    /// sonar timeout; a missing echo comes back as `NoReading`.
    pub async fn measure(&mut self) -> DistanceSample {
        self.trigger.set_low();
        block_for(Duration::from_micros(Self::TRIG_SETTLE_US));
        self.trigger.set_high();
        block_for(Duration::from_micros(Self::TRIG_PULSE_US));
        self.trigger.set_low();

        match select(
            Self::echo_width_us(&mut self.echo),
            Timer::after(Duration::from_micros(SONAR_TIMEOUT_US as u64)),
        )
        .await
        {
            Either::First(width_us) => DistanceSample::from_echo_us(width_us),
            Either::Second(_) => DistanceSample::NoReading,
        }
    }

    async fn echo_width_us(echo: &mut ExtiInput<'d, E>) -> u32 {
        echo.wait_for_rising_edge().await;
        let rise = Instant::now();
        echo.wait_for_falling_edge().await;
        (Instant::now() - rise).as_micros() as u32
    }
}
