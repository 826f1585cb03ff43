use core::fmt::{self, Write};

pub type TelemetryLine = heapless::String<128>;

/// One diagnostic sample of the control loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryFrame {
    /// Seconds since launch, zero on the ground.
    pub flight_time_s: f32,
    pub right_cm: f32,
    pub height_cm: f32,
    pub rate_right_cm_s: f32,
    pub rate_height_cm_s: f32,
    pub rudder_us: u16,
    pub elevator_us: u16,
}

impl TelemetryFrame {
    pub fn write_line<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "T:{:.2} | DistR:{:.1} | DistH:{:.1} | RateR:{:.1} | RateH:{:.1} | Rud:{} | Ele:{}\r\n",
            self.flight_time_s,
            self.right_cm,
            self.height_cm,
            self.rate_right_cm_s,
            self.rate_height_cm_s,
            self.rudder_us,
            self.elevator_us,
        )
    }

    /// Formats into a fixed buffer. A line that does not fit is truncated.
    pub fn to_line(&self) -> TelemetryLine {
        let mut line = TelemetryLine::new();
        let _ = self.write_line(&mut line);
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_one_line() {
        let frame = TelemetryFrame {
            flight_time_s: 1.25,
            right_cm: 96.5,
            height_cm: 72.3,
            rate_right_cm_s: 80.0,
            rate_height_cm_s: -12.5,
            rudder_us: 1140,
            elevator_us: 1100,
        };
        assert_eq!(
            frame.to_line().as_str(),
            "T:1.25 | DistR:96.5 | DistH:72.3 | RateR:80.0 | RateH:-12.5 | Rud:1140 | Ele:1100\r\n"
        );
    }

    #[test]
    fn worst_case_line_fits() {
        let frame = TelemetryFrame {
            flight_time_s: 99999.99,
            right_cm: -9999.9,
            height_cm: -9999.9,
            rate_right_cm_s: -99999.9,
            rate_height_cm_s: -99999.9,
            rudder_us: u16::MAX,
            elevator_us: u16::MAX,
        };
        assert!(frame.to_line().ends_with("\r\n"));
    }
}
