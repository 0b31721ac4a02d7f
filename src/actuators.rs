use crate::types::Channel;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ActuationFault {
    Unreachable { channel: Channel, reason: String },
}

impl fmt::Display for ActuationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuationFault::Unreachable { channel, reason } => {
                write!(f, "failed to drive {:?} servo: {}", channel, reason)
            }
        }
    }
}

impl Error for ActuationFault {}

/// Contract to the two angular actuators. Implementations clamp out-of-range
/// angles to the actuation range rather than rejecting them; the dispatcher
/// forwards whatever the sender asked for.
pub trait Actuators {
    fn move_to(&mut self, channel: Channel, angle: i32) -> Result<(), ActuationFault>;
}
