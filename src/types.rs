use strum_macros::EnumIter;

#[derive(Debug, EnumIter, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Channel {
    Left = 0,  // 0 to 135, PWM board channel 0
    Right = 1, // 0 to 135, PWM board channel 1, mounted reversed
}

pub(crate) fn clamp_angle(angle: i32) -> i32 {
    use crate::constants::{MAX_ANGLE, MIN_ANGLE};
    angle.max(MIN_ANGLE).min(MAX_ANGLE)
}
