use crate::constants::{MAX_ANGLE, MSG_TELEMETRY_QUERY, PACKET_LEN};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum PacketError {
    Truncated {
        expected_len: usize,
        actual_len: usize,
    },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::Truncated { expected_len, actual_len } => {
                write!(f, "truncated packet: expected {} bytes but got {}", expected_len, actual_len)
            }
        }
    }
}

impl Error for PacketError {}

/// A decoded 16-byte command packet.
///
/// The right servo is mounted reversed, so its wire field carries
/// `135 - angle`. The mirroring is undone here on decode and re-applied on
/// encode; everything past the codec works in physical degrees. The
/// subtraction wraps on extreme wire values, so a hostile datagram cannot
/// panic the codec; the actuator gateway clamps before anything moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandPacket {
    pub left_angle: i32,
    pub right_angle: i32,
    pub message_type: i32,
    pub timestamp: f32,
}

impl CommandPacket {
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < PACKET_LEN {
            return Err(PacketError::Truncated {
                expected_len: PACKET_LEN,
                actual_len: data.len(),
            });
        }

        Ok(CommandPacket {
            left_angle: read_i32(data, 0),
            right_angle: MAX_ANGLE.wrapping_sub(read_i32(data, 4)),
            message_type: read_i32(data, 8),
            timestamp: f32::from_le_bytes([data[12], data[13], data[14], data[15]]),
        })
    }

    pub fn is_telemetry_query(&self) -> bool {
        self.message_type == MSG_TELEMETRY_QUERY
    }
}

/// Outgoing packet, tagged by what its correlation field carries. Both
/// variants flatten to the same 16-byte layout on the wire; a telemetry
/// reply stores the measured voltage where the timestamp normally goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    Echo {
        left_angle: i32,
        right_angle: i32,
        message_type: i32,
        timestamp: f32,
    },
    Telemetry {
        left_angle: i32,
        right_angle: i32,
        voltage: f32,
    },
}

impl Reply {
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let (left_angle, right_angle, message_type, correlation) = match *self {
            Reply::Echo { left_angle, right_angle, message_type, timestamp } => {
                (left_angle, right_angle, message_type, timestamp)
            }
            Reply::Telemetry { left_angle, right_angle, voltage } => {
                (left_angle, right_angle, MSG_TELEMETRY_QUERY, voltage)
            }
        };

        let mut buf = [0u8; PACKET_LEN];
        buf[0..4].copy_from_slice(&left_angle.to_le_bytes());
        buf[4..8].copy_from_slice(&MAX_ANGLE.wrapping_sub(right_angle).to_le_bytes());
        buf[8..12].copy_from_slice(&message_type.to_le_bytes());
        buf[12..16].copy_from_slice(&correlation.to_le_bytes());
        buf
    }
}

fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
