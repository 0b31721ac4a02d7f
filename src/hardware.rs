//! rppal-backed gateway implementations for the real board: a PCA9685
//! 16-channel PWM controller on the I2C bus drives the servos, and an
//! MCP3008 ADC on SPI samples the battery.

use crate::actuators::{ActuationFault, Actuators};
use crate::constants::{ADC_REFERENCE_VOLTS, MAX_ANGLE, MAX_PULSE_US, MIN_PULSE_US};
use crate::telemetry::{SensorFault, VoltageSensor};
use crate::types::{clamp_angle, Channel};
use parking_lot::Mutex;
use rppal::i2c::I2c;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PCA9685_ADDR: u16 = 0x40;
const REG_MODE1: u8 = 0x00;
const REG_PRESCALE: u8 = 0xfe;
const REG_LED0_ON_L: u8 = 0x06;
const MODE1_SLEEP: u8 = 0x10;
const MODE1_AUTO_INC: u8 = 0x20;
const MODE1_RESTART: u8 = 0x80;

const OSC_CLOCK_HZ: f32 = 25_000_000.0;
const PWM_FREQ_HZ: f32 = 50.0;
const PWM_PERIOD_US: f32 = 1_000_000.0 / PWM_FREQ_HZ;
const PWM_STEPS: f32 = 4096.0;

const SPI_CLOCK_HZ: u32 = 1_350_000;
const ADC_FULL_SCALE: f32 = 1023.0;

/// One servo output on the PWM board. Channels share the bus handle; the
/// pulse-width calibration is per channel.
struct ServoOutput {
    bus: Arc<Mutex<I2c>>,
    index: u8,
    min_pulse_us: f32,
    max_pulse_us: f32,
}

impl ServoOutput {
    fn set_angle(&self, angle: i32) -> Result<(), rppal::i2c::Error> {
        let angle = clamp_angle(angle) as f32;
        let span = self.max_pulse_us - self.min_pulse_us;
        let pulse_us = self.min_pulse_us + span * angle / MAX_ANGLE as f32;
        let off_step = (pulse_us * PWM_STEPS / PWM_PERIOD_US).round() as u16;

        // LEDn_ON stays at step 0; only the OFF step encodes the pulse width.
        let base = REG_LED0_ON_L + 4 * self.index;
        let mut bus = self.bus.lock();
        bus.write(&[base, 0x00, 0x00, (off_step & 0xff) as u8, (off_step >> 8) as u8])?;
        Ok(())
    }
}

pub struct Pca9685Servos {
    outputs: [ServoOutput; 2],
}

impl Pca9685Servos {
    /// Opens the I2C bus and configures the board for 50 Hz servo PWM with
    /// the FT5121M pulse-width calibration on both channels.
    pub fn new() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(PCA9685_ADDR)?;

        // prescale = osc / (steps * freq) - 1, set while the oscillator
        // sleeps, then restart with the auto-increment bit so the 4-byte
        // LEDn writes land on consecutive registers.
        let prescale = (OSC_CLOCK_HZ / (PWM_STEPS * PWM_FREQ_HZ)).round() as u8 - 1;
        i2c.write(&[REG_MODE1, MODE1_SLEEP])?;
        i2c.write(&[REG_PRESCALE, prescale])?;
        i2c.write(&[REG_MODE1, MODE1_AUTO_INC])?;
        thread::sleep(Duration::from_millis(5));
        i2c.write(&[REG_MODE1, MODE1_AUTO_INC | MODE1_RESTART])?;

        let bus = Arc::new(Mutex::new(i2c));
        let output = |index: u8| ServoOutput {
            bus: Arc::clone(&bus),
            index,
            min_pulse_us: MIN_PULSE_US,
            max_pulse_us: MAX_PULSE_US,
        };

        Ok(Pca9685Servos {
            outputs: [output(Channel::Left as u8), output(Channel::Right as u8)],
        })
    }
}

impl Actuators for Pca9685Servos {
    fn move_to(&mut self, channel: Channel, angle: i32) -> Result<(), ActuationFault> {
        self.outputs[channel as usize]
            .set_angle(angle)
            .map_err(|e| ActuationFault::Unreachable {
                channel,
                reason: e.to_string(),
            })
    }
}

pub struct Mcp3008Sensor {
    spi: Spi,
    channel: u8,
}

impl Mcp3008Sensor {
    pub fn new(channel: u8) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;
        Ok(Mcp3008Sensor { spi, channel })
    }
}

impl VoltageSensor for Mcp3008Sensor {
    fn read_raw_volts(&mut self) -> Result<f32, SensorFault> {
        // Start bit, then single-ended mode + channel select; the 10-bit
        // result spans the low bits of the last two response bytes.
        let request = [0x01, 0x80 | (self.channel << 4), 0x00];
        let mut response = [0u8; 3];
        self.spi
            .transfer(&mut response, &request)
            .map_err(|e| SensorFault::Unreachable { reason: e.to_string() })?;

        let raw = ((response[1] & 0x03) as u16) << 8 | response[2] as u16;
        Ok(raw as f32 / ADC_FULL_SCALE * ADC_REFERENCE_VOLTS)
    }
}
