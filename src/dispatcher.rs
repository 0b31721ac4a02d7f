use crate::actuators::{ActuationFault, Actuators};
use crate::constants::MIN_ANGLE;
use crate::packet::{CommandPacket, Reply};
use crate::telemetry::{PowerMonitor, SensorFault, VoltageSensor};
use crate::types::Channel;
use log::{debug, warn};
use strum::IntoEnumIterator;

/// The protocol core. Owns the last-commanded angle for each channel and is
/// the only place actuator state is ever mutated; the transport loop calls
/// `handle` strictly in packet-arrival order.
pub struct Dispatcher<A, S> {
    actuators: A,
    power: PowerMonitor<S>,
    commanded: [i32; 2],
}

impl<A: Actuators, S: VoltageSensor> Dispatcher<A, S> {
    pub fn new(actuators: A, sensor: S) -> Self {
        Dispatcher {
            actuators,
            power: PowerMonitor::new(sensor),
            commanded: [MIN_ANGLE, MIN_ANGLE],
        }
    }

    /// Drives both channels to the neutral pose and records it as the
    /// commanded state. Called once at startup, before the loop runs.
    pub fn reset_to_neutral(&mut self) -> Result<(), ActuationFault> {
        for channel in Channel::iter() {
            self.actuators.move_to(channel, MIN_ANGLE)?;
            self.commanded[channel as usize] = MIN_ANGLE;
        }
        Ok(())
    }

    pub fn read_voltage(&mut self) -> Result<f32, SensorFault> {
        self.power.read_voltage()
    }

    pub fn handle(&mut self, packet: &CommandPacket) -> Reply {
        if packet.is_telemetry_query() {
            let voltage = match self.power.read_voltage() {
                Ok(voltage) => {
                    debug!("battery voltage: {:.2}V", voltage);
                    voltage
                }
                Err(e) => {
                    warn!("{}", e);
                    0.0
                }
            };

            return Reply::Telemetry {
                left_angle: self.commanded[Channel::Left as usize],
                right_angle: self.commanded[Channel::Right as usize],
                voltage,
            };
        }

        for (channel, requested) in [
            (Channel::Left, packet.left_angle),
            (Channel::Right, packet.right_angle),
        ] {
            let slot = channel as usize;
            if self.commanded[slot] == requested {
                // Unchanged since the last command; skip the hardware write
                // so a sender streaming at a fixed rate never causes jitter.
                continue;
            }

            debug!("moving {:?} servo to {} degrees", channel, requested);
            match self.actuators.move_to(channel, requested) {
                Ok(()) => self.commanded[slot] = requested,
                // Leave the commanded angle untouched so the next identical
                // command retries the move.
                Err(e) => warn!("{}", e),
            }
        }

        Reply::Echo {
            left_angle: self.commanded[Channel::Left as usize],
            right_angle: self.commanded[Channel::Right as usize],
            message_type: packet.message_type,
            timestamp: packet.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingActuators {
        moves: Vec<(Channel, i32)>,
        fail: bool,
    }

    impl RecordingActuators {
        fn new() -> Self {
            RecordingActuators { moves: Vec::new(), fail: false }
        }
    }

    impl Actuators for RecordingActuators {
        fn move_to(&mut self, channel: Channel, angle: i32) -> Result<(), ActuationFault> {
            if self.fail {
                return Err(ActuationFault::Unreachable {
                    channel,
                    reason: "bus offline".into(),
                });
            }
            self.moves.push((channel, angle));
            Ok(())
        }
    }

    struct FixedSensor(f32);

    impl VoltageSensor for FixedSensor {
        fn read_raw_volts(&mut self) -> Result<f32, SensorFault> {
            Ok(self.0)
        }
    }

    fn actuation(left_angle: i32, right_angle: i32, timestamp: f32) -> CommandPacket {
        CommandPacket { left_angle, right_angle, message_type: 0, timestamp }
    }

    fn telemetry_query() -> CommandPacket {
        CommandPacket { left_angle: 0, right_angle: 135, message_type: 4, timestamp: 0.0 }
    }

    #[test]
    fn actuation_moves_both_channels_and_echoes() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        let reply = dispatcher.handle(&actuation(90, 90, 12.5));

        assert_eq!(dispatcher.actuators.moves, vec![(Channel::Left, 90), (Channel::Right, 90)]);
        assert_eq!(
            reply,
            Reply::Echo { left_angle: 90, right_angle: 90, message_type: 0, timestamp: 12.5 }
        );
    }

    #[test]
    fn repeated_command_is_suppressed() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        dispatcher.handle(&actuation(90, 90, 12.5));
        let reply = dispatcher.handle(&actuation(90, 90, 9.9));

        assert_eq!(dispatcher.actuators.moves.len(), 2);
        assert_eq!(
            reply,
            Reply::Echo { left_angle: 90, right_angle: 90, message_type: 0, timestamp: 9.9 }
        );
    }

    #[test]
    fn only_the_changed_channel_moves() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        dispatcher.handle(&actuation(90, 90, 1.0));
        dispatcher.handle(&actuation(90, 45, 2.0));

        assert_eq!(
            dispatcher.actuators.moves,
            vec![(Channel::Left, 90), (Channel::Right, 90), (Channel::Right, 45)]
        );
    }

    #[test]
    fn telemetry_reports_voltage_without_touching_servos() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        dispatcher.handle(&actuation(90, 45, 1.0));
        let reply = dispatcher.handle(&telemetry_query());

        assert_eq!(dispatcher.actuators.moves.len(), 2);
        match reply {
            Reply::Telemetry { left_angle, right_angle, voltage } => {
                assert_eq!(left_angle, 90);
                assert_eq!(right_angle, 45);
                assert!((voltage - 11.1 * 3.647).abs() < 1e-4);
            }
            other => panic!("expected telemetry reply, got {:?}", other),
        }
    }

    #[test]
    fn consecutive_telemetry_queries_echo_identical_angles() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        dispatcher.handle(&actuation(30, 60, 1.0));
        let first = dispatcher.handle(&telemetry_query());
        let second = dispatcher.handle(&telemetry_query());

        assert_eq!(first, second);
        assert_eq!(dispatcher.actuators.moves.len(), 2);
    }

    #[test]
    fn actuation_fault_keeps_old_state_and_still_replies() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        dispatcher.handle(&actuation(90, 90, 1.0));
        dispatcher.actuators.fail = true;
        let reply = dispatcher.handle(&actuation(10, 20, 2.0));

        assert_eq!(
            reply,
            Reply::Echo { left_angle: 90, right_angle: 90, message_type: 0, timestamp: 2.0 }
        );

        // Hardware back: the retried command goes through.
        dispatcher.actuators.fail = false;
        dispatcher.handle(&actuation(10, 20, 3.0));
        assert_eq!(dispatcher.actuators.moves.len(), 4);
    }

    #[test]
    fn neutral_reset_drives_both_channels_to_zero() {
        let mut dispatcher = Dispatcher::new(RecordingActuators::new(), FixedSensor(11.1));

        dispatcher.handle(&actuation(90, 90, 1.0));
        dispatcher.reset_to_neutral().unwrap();

        assert_eq!(
            dispatcher.actuators.moves,
            vec![(Channel::Left, 90), (Channel::Right, 90), (Channel::Left, 0), (Channel::Right, 0)]
        );
        assert_eq!(dispatcher.commanded, [0, 0]);
    }
}
