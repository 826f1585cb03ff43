pub mod hcsr04;
pub mod servo_pwm;
