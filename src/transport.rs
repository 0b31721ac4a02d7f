use crate::actuators::Actuators;
use crate::constants::{COMMAND_PORT, PACKET_LEN, RECV_BUFFER_LEN, REPLY_QUEUE_DEPTH};
use crate::dispatcher::Dispatcher;
use crate::packet::CommandPacket;
use crate::telemetry::VoltageSensor;
use log::{debug, info, warn};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// The UDP receive loop. One socket serves both directions: commands come in
/// on it, and a single sender task drains a bounded queue of replies back out
/// of it, so a slow or failing send never delays the next receive.
pub struct Server<A, S> {
    socket: Arc<UdpSocket>,
    dispatcher: Dispatcher<A, S>,
    reply_port: u16,
}

impl<A: Actuators, S: VoltageSensor> Server<A, S> {
    pub async fn bind(
        addr: &str,
        dispatcher: Dispatcher<A, S>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let socket = UdpSocket::bind(addr).await?;
        info!("listening on {}", socket.local_addr()?);
        Ok(Server {
            socket: Arc::new(socket),
            dispatcher,
            reply_port: COMMAND_PORT,
        })
    }

    /// Overrides the port replies are addressed to. The wire convention is
    /// the fixed command port; peers listening elsewhere can ask for it.
    pub fn with_reply_port(mut self, port: u16) -> Self {
        self.reply_port = port;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn run(mut self) {
        let (reply_tx, reply_rx) = mpsc::channel(REPLY_QUEUE_DEPTH);
        tokio::spawn(send_replies(Arc::clone(&self.socket), reply_rx));

        let mut buf = [0u8; RECV_BUFFER_LEN];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!("receive failed: {}", e);
                    continue;
                }
            };

            let packet = match CommandPacket::decode(&buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    debug!("dropping datagram from {}: {}", peer, e);
                    continue;
                }
            };
            debug!("received {:?} from {}", packet, peer);

            let reply = self.dispatcher.handle(&packet);

            // Replies go back to the sender's address on the reply port,
            // mirroring what the other end listens on.
            let target = SocketAddr::new(peer.ip(), self.reply_port);
            if reply_tx.try_send((reply.encode(), target)).is_err() {
                warn!("reply queue full, dropping reply to {}", target);
            }
        }
    }
}

async fn send_replies(
    socket: Arc<UdpSocket>,
    mut queue: mpsc::Receiver<([u8; PACKET_LEN], SocketAddr)>,
) {
    while let Some((bytes, target)) = queue.recv().await {
        match socket.send_to(&bytes, target).await {
            Ok(_) => debug!("sent reply to {}", target),
            Err(e) => warn!("failed to send reply to {}: {}", target, e),
        }
    }
}
