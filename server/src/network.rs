//! Server network layer: TCP accept loop, per-connection tasks, and the
//! single-owner session event loop.
//!
//! Each accepted connection gets one reader task (lines in, events out) and
//! one writer task (queued lines out). All session state lives in the event
//! loop's `SessionManager`, so there is no shared lock; outbound frames go
//! through per-connection channels and never block the loop on a slow peer.

use crate::session::{SessionManager, StartCheck};
use log::{debug, error, info, warn};
use shared::protocol::Message;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Events from connection reader tasks to the session event loop
#[derive(Debug)]
pub enum SessionEvent {
    Ready { id: u8 },
    Update { id: u8, health: f32, score: u32 },
    Disconnected { id: u8 },
}

/// Rendezvous server for one two-participant session.
pub struct Server {
    listener: TcpListener,
    manager: SessionManager,
    /// Outbound line queue per connection; the writer tasks own the sockets
    senders: HashMap<u8, mpsc::UnboundedSender<String>>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    event_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Server {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            manager: SessionManager::new(),
            senders: HashMap::new(),
            event_tx,
            event_rx,
        })
    }

    /// The bound address; useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main loop: accepts connections and applies session events until the
    /// process is terminated. Accept failures are connection errors and
    /// therefore fatal.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, addr) = accepted.map_err(|e| {
                        error!("Accept failed: {}", e);
                        e
                    })?;
                    self.handle_connection(stream, addr);
                },

                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        // unreachable while we hold event_tx
                        None => break,
                    }
                },
            }
        }

        Ok(())
    }

    /// Admits or rejects one freshly accepted connection. Rejection happens
    /// before any identity is assigned and leaves the slot table untouched.
    fn handle_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        let id = match self.manager.add_player(addr) {
            Some(id) => id,
            None => {
                info!("Rejecting connection from {}: server full", addr);
                tokio::spawn(async move {
                    let mut stream = stream;
                    let line = Message::ServerFull.encode() + "\n";
                    let _ = stream.write_all(line.as_bytes()).await;
                    // dropping the stream closes the socket
                });
                return;
            }
        };

        let (read_half, write_half) = stream.into_split();
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        spawn_writer(id, write_half, line_rx);
        spawn_reader(id, read_half, self.event_tx.clone());
        self.senders.insert(id, line_tx);

        self.send_to(id, &Message::Id(id));
        self.run_start_check();
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Ready { id } => {
                if self.manager.mark_ready(id) {
                    debug!("Player {} is ready", id);
                    self.run_start_check();
                }
            }

            SessionEvent::Update { id, health, score } => {
                if !self.manager.apply_update(id, health, score) {
                    return;
                }
                // relay the stored (clamped) state to everyone but the sender
                if let Some(slot) = self.manager.get(id) {
                    let state = Message::State {
                        id,
                        health: slot.health,
                        score: slot.score,
                    };
                    for peer in self.manager.peer_ids(id) {
                        self.send_to(peer, &state);
                    }
                }
            }

            SessionEvent::Disconnected { id } => {
                self.senders.remove(&id);
                if self.manager.remove_player(id) && !self.manager.is_full() {
                    // drop the survivors back to the ready handshake
                    self.broadcast(&Message::Waiting);
                }
            }
        }
    }

    fn run_start_check(&mut self) {
        match self.manager.check_start() {
            StartCheck::Started => self.broadcast(&Message::Start),
            StartCheck::StillWaiting => self.broadcast(&Message::Waiting),
            StartCheck::AwaitingReady | StartCheck::AlreadyPlaying => {}
        }
    }

    fn send_to(&self, id: u8, message: &Message) {
        if let Some(sender) = self.senders.get(&id) {
            if sender.send(message.encode() + "\n").is_err() {
                debug!("Writer for player {} is gone", id);
            }
        }
    }

    fn broadcast(&self, message: &Message) {
        debug!("Broadcasting: {}", message.encode());
        for id in self.manager.player_ids() {
            self.send_to(id, message);
        }
    }
}

/// Drains the outbound queue onto the socket until the queue closes or a
/// write fails.
fn spawn_writer(id: u8, mut half: OwnedWriteHalf, mut lines: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        while let Some(line) = lines.recv().await {
            if let Err(e) = half.write_all(line.as_bytes()).await {
                debug!("Send to player {} failed: {}", id, e);
                break;
            }
        }
    });
}

/// Turns inbound frames into session events. EOF and read errors both count
/// as a disconnect; malformed frames are dropped with no state change.
fn spawn_reader(id: u8, half: OwnedReadHalf, events: mpsc::UnboundedSender<SessionEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(half).lines();

        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => match Message::parse(&line) {
                    Ok(Message::Ready) => SessionEvent::Ready { id },
                    Ok(Message::Update { health, score }) => SessionEvent::Update {
                        id,
                        health,
                        score,
                    },
                    Ok(other) => {
                        warn!("Unexpected frame from player {}: {:?}", id, other);
                        continue;
                    }
                    Err(err) => {
                        debug!("Ignoring malformed frame from player {}: {}", id, err);
                        continue;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    debug!("Receive from player {} failed: {}", id, e);
                    break;
                }
            };

            if events.send(event).is_err() {
                return;
            }
        }

        let _ = events.send(SessionEvent::Disconnected { id });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_event_creation() {
        let event = SessionEvent::Update {
            id: 1,
            health: 90.0,
            score: 100,
        };

        match event {
            SessionEvent::Update { id, health, score } => {
                assert_eq!(id, 1);
                assert_eq!(health, 90.0);
                assert_eq!(score, 100);
            }
            _ => panic!("Unexpected event type"),
        }
    }

    #[test]
    fn test_event_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();

        assert!(tx.send(SessionEvent::Ready { id: 2 }).is_ok());

        match rx.try_recv().unwrap() {
            SessionEvent::Ready { id } => assert_eq!(id, 2),
            _ => panic!("Unexpected event type"),
        }
    }

    #[tokio::test]
    async fn test_bind_on_ephemeral_port() {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert!(server.manager.is_empty());
    }

    #[tokio::test]
    async fn test_new_connection_gets_identity_frame() {
        let mut server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let first = lines.next_line().await.unwrap().unwrap();
        assert_eq!(Message::parse(&first).unwrap(), Message::Id(1));
    }
}
