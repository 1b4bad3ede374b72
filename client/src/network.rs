//! Client connection handling and the simulation driver.
//!
//! `connect` splits the server stream three ways: a writer task draining the
//! outbound frame queue, the sync agent owning the read half, and the
//! simulation loop in `run` ticking at 60 Hz. The loop and the agent share
//! the session through its single lock; socket writes always happen on the
//! writer task, outside any critical section.

use crate::game::{self, SessionState, SharedSession};
use crate::input::InputSource;
use crate::sync;
use log::{error, info};
use rand::Rng;
use shared::protocol::Message;
use shared::SessionPhase;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

const TICK: Duration = Duration::from_millis(16);
const TICK_DT: f32 = 1.0 / 60.0;

pub struct Client {
    session: SharedSession,
    outbound: mpsc::UnboundedSender<Message>,
}

impl Client {
    /// Connects to the server and spawns the writer task and sync agent.
    pub async fn connect(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to {}", addr);

        let (read_half, mut write_half) = stream.into_split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let line = message.encode() + "\n";
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    error!("Send failed: {}", e);
                    break;
                }
            }
        });

        let session = SessionState::shared();
        tokio::spawn(sync::run_sync_agent(read_half, session.clone()));

        Ok(Client { session, outbound })
    }

    /// Handle to the shared session, for rendering or inspection.
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// Signals readiness for the start handshake.
    pub fn send_ready(&self) {
        game::lock(&self.session).mark_ready();
        let _ = self.outbound.send(Message::Ready);
    }

    /// Runs the simulation loop until the session reaches `GameOver`.
    /// Frames produced under the lock drain through the writer task.
    pub async fn run<I, R>(&mut self, mut input: I, mut rng: R)
    where
        I: InputSource,
        R: Rng,
    {
        self.send_ready();

        let mut ticker = interval(TICK);
        loop {
            ticker.tick().await;

            let (over, outbound) = {
                let mut state = game::lock(&self.session);
                let outbound = state.tick(TICK_DT, input.poll(), &mut rng);
                (state.phase == SessionPhase::GameOver, outbound)
            };

            if let Some(message) = outbound {
                if self.outbound.send(message).is_err() {
                    // writer gone means the connection is gone; the sync
                    // agent will flip the phase shortly
                    break;
                }
            }

            if over {
                break;
            }
        }

        info!("Session over");
    }
}
