pub const COMMAND_PORT: u16 = 5005;
pub const PACKET_LEN: usize = 16;
pub const RECV_BUFFER_LEN: usize = 1024;
pub const REPLY_QUEUE_DEPTH: usize = 32;

// Message type constants
pub const MSG_TELEMETRY_QUERY: i32 = 4;

// FT5121M servo movement constants
pub const MIN_ANGLE: i32 = 0;
pub const MAX_ANGLE: i32 = 135;
pub const MIN_PULSE_US: f32 = 810.0;
pub const MAX_PULSE_US: f32 = 2100.0;

// Battery sensing constants
pub const ADC_CHANNEL: u8 = 0;
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;
pub const VOLTAGE_SCALE: f32 = 3.647;
