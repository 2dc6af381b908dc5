use std::{
    io::ErrorKind,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use rosc::{OscMessage, OscPacket};
use tracing::{debug, info, warn};

use crate::{config::validate_port, MapError, RemoteConfig, Result};

/// How often the listener thread checks for shutdown while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// UDP listener that decodes OSC packets on its own thread and queues the
/// messages for the main thread.
///
/// The listener never touches the model. The owner calls
/// [`RemoteReceiver::drain`] once per tick; it never blocks. The queue holds
/// at most `capacity` messages; anything arriving while it is full is dropped.
pub struct RemoteReceiver {
    queue: Receiver<OscMessage>,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RemoteReceiver {
    /// Listens on all interfaces at the configured port.
    pub fn bind(config: &RemoteConfig) -> Result<Self> {
        validate_port(u32::from(config.port))?;
        Self::bind_addr(("0.0.0.0", config.port), config.queue_capacity)
    }

    /// Listens on an explicit address. Port 0 picks a free port.
    pub fn bind_addr(addr: impl ToSocketAddrs, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MapError::InvalidInput("remote queue capacity must be positive"));
        }
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, queue) = mpsc::sync_channel(capacity);

        let flag = shutdown.clone();
        let worker = thread::Builder::new()
            .name("osc-receiver".to_string())
            .spawn(move || listen(socket, tx, flag))?;

        info!(%local_addr, capacity, "remote control listening");
        Ok(Self {
            queue,
            local_addr,
            shutdown,
            worker: Some(worker),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Takes up to `budget` queued messages without waiting.
    pub fn drain(&self, budget: usize) -> Vec<OscMessage> {
        let mut messages = Vec::new();
        while messages.len() < budget {
            match self.queue.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if messages.is_empty() {
                        debug!("remote listener has stopped");
                    }
                    break;
                }
            }
        }
        messages
    }
}

impl Drop for RemoteReceiver {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("remote listener thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for RemoteReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteReceiver")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

fn listen(socket: UdpSocket, tx: SyncSender<OscMessage>, shutdown: Arc<AtomicBool>) {
    let mut buf = [0u8; rosc::decoder::MTU];
    let mut dropped: u64 = 0;
    while !shutdown.load(Ordering::Relaxed) {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                continue
            }
            Err(err) => {
                warn!(%err, "remote socket error");
                thread::sleep(POLL_INTERVAL);
                continue;
            }
        };

        let packet = match rosc::decoder::decode_udp(&buf[..len]) {
            Ok((_, packet)) => packet,
            Err(err) => {
                warn!(%peer, err = ?MapError::from(err), "dropping undecodable packet");
                continue;
            }
        };

        let mut messages = Vec::new();
        flatten(packet, &mut messages);
        for message in messages {
            match tx.try_send(message) {
                Ok(()) => {
                    if dropped > 0 {
                        warn!(dropped, "remote queue was full, messages dropped");
                        dropped = 0;
                    }
                }
                Err(TrySendError::Full(message)) => {
                    if dropped == 0 {
                        debug!(%peer, addr = %message.addr, "remote queue full");
                    }
                    dropped += 1;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(message) => out.push(message),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use rosc::{encoder, OscBundle, OscTime, OscType};

    use super::*;

    fn wait_for(receiver: &RemoteReceiver, count: usize) -> Vec<OscMessage> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut received = Vec::new();
        while received.len() < count && Instant::now() < deadline {
            received.extend(receiver.drain(16));
            thread::sleep(Duration::from_millis(5));
        }
        received
    }

    fn send(receiver: &RemoteReceiver, packet: &OscPacket) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let bytes = encoder::encode(packet).unwrap();
        socket
            .send_to(&bytes, ("127.0.0.1", receiver.local_addr().port()))
            .unwrap();
    }

    #[test]
    fn queues_messages_and_flattens_bundles() {
        let receiver = RemoteReceiver::bind_addr("127.0.0.1:0", 16).unwrap();
        send(
            &receiver,
            &OscPacket::Message(OscMessage {
                addr: "/add/quad".into(),
                args: vec![],
            }),
        );
        send(
            &receiver,
            &OscPacket::Bundle(OscBundle {
                timetag: OscTime::from((0, 1)),
                content: vec![
                    OscPacket::Message(OscMessage {
                        addr: "/paint/media/play".into(),
                        args: vec![OscType::Int(1)],
                    }),
                    OscPacket::Message(OscMessage {
                        addr: "/undo".into(),
                        args: vec![],
                    }),
                ],
            }),
        );

        let received = wait_for(&receiver, 3);
        let addrs: Vec<&str> = received.iter().map(|m| m.addr.as_str()).collect();
        assert_eq!(addrs, vec!["/add/quad", "/paint/media/play", "/undo"]);
    }

    #[test]
    fn garbage_is_dropped_without_stopping_the_listener() {
        let receiver = RemoteReceiver::bind_addr("127.0.0.1:0", 16).unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .send_to(b"\xff\x00garbage", receiver.local_addr())
            .unwrap();
        send(
            &receiver,
            &OscPacket::Message(OscMessage {
                addr: "/redo".into(),
                args: vec![],
            }),
        );

        let received = wait_for(&receiver, 1);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].addr, "/redo");
    }

    #[test]
    fn drain_respects_budget() {
        let receiver = RemoteReceiver::bind_addr("127.0.0.1:0", 16).unwrap();
        for _ in 0..3 {
            send(
                &receiver,
                &OscPacket::Message(OscMessage {
                    addr: "/add/ellipse".into(),
                    args: vec![],
                }),
            );
        }
        thread::sleep(Duration::from_millis(200));
        assert_eq!(receiver.drain(2).len(), 2);
        assert!(receiver.drain(0).is_empty());
    }

    #[test]
    fn full_queue_drops_instead_of_growing() {
        let receiver = RemoteReceiver::bind_addr("127.0.0.1:0", 4).unwrap();
        for _ in 0..20 {
            send(
                &receiver,
                &OscPacket::Message(OscMessage {
                    addr: "/add/quad".into(),
                    args: vec![],
                }),
            );
        }
        thread::sleep(Duration::from_millis(300));
        assert_eq!(receiver.drain(100).len(), 4);

        // Room frees up once drained.
        send(
            &receiver,
            &OscPacket::Message(OscMessage {
                addr: "/undo".into(),
                args: vec![],
            }),
        );
        let received = wait_for(&receiver, 1);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].addr, "/undo");
    }

    #[test]
    fn bind_rejects_privileged_port_and_empty_queue() {
        let config = RemoteConfig {
            port: 80,
            ..RemoteConfig::default()
        };
        assert!(matches!(
            RemoteReceiver::bind(&config),
            Err(MapError::InvalidPort(80))
        ));
        assert!(matches!(
            RemoteReceiver::bind_addr("127.0.0.1:0", 0),
            Err(MapError::InvalidInput(_))
        ));
    }
}
