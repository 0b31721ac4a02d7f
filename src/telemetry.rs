use crate::constants::VOLTAGE_SCALE;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SensorFault {
    Unreachable { reason: String },
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFault::Unreachable { reason } => {
                write!(f, "failed to sample battery sensor: {}", reason)
            }
        }
    }
}

impl Error for SensorFault {}

/// Contract to the analog battery sensor. Returns the voltage seen at the
/// ADC pin, before divider correction.
pub trait VoltageSensor {
    fn read_raw_volts(&mut self) -> Result<f32, SensorFault>;
}

/// Converts raw sensor readings into supply voltage. The battery is measured
/// through a resistor divider; 3.647 is its empirical factor.
pub struct PowerMonitor<S> {
    sensor: S,
}

impl<S: VoltageSensor> PowerMonitor<S> {
    pub fn new(sensor: S) -> Self {
        PowerMonitor { sensor }
    }

    pub fn read_voltage(&mut self) -> Result<f32, SensorFault> {
        Ok(self.sensor.read_raw_volts()? * VOLTAGE_SCALE)
    }
}
