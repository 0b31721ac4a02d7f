mod actuators;
mod constants;
mod dispatcher;
mod hardware;
mod packet;
mod telemetry;
mod transport;
mod types;

pub use actuators::{ActuationFault, Actuators};
pub use dispatcher::Dispatcher;
pub use hardware::{Mcp3008Sensor, Pca9685Servos};
pub use packet::{CommandPacket, PacketError, Reply};
pub use telemetry::{PowerMonitor, SensorFault, VoltageSensor};
pub use transport::Server;
pub use types::Channel;

// Re-export commonly used items
pub use constants::{ADC_CHANNEL, COMMAND_PORT, MSG_TELEMETRY_QUERY, PACKET_LEN};
