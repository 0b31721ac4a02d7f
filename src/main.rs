use log::info;
use servo_bridge::{Dispatcher, Mcp3008Sensor, Pca9685Servos, Server, ADC_CHANNEL, COMMAND_PORT};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::init();

    let servos = Pca9685Servos::new()?;
    let sensor = Mcp3008Sensor::new(ADC_CHANNEL)?;

    let mut dispatcher = Dispatcher::new(servos, sensor);
    dispatcher.reset_to_neutral()?;

    if let Ok(voltage) = dispatcher.read_voltage() {
        info!("battery voltage: {:.2}V", voltage);
    }

    let addr = std::env::var("SERVO_BRIDGE_ADDR")
        .unwrap_or_else(|_| format!("0.0.0.0:{}", COMMAND_PORT));
    let server = Server::bind(&addr, dispatcher).await?;
    server.run().await;
    Ok(())
}
