//! The sync agent: the client's network receive path.
//!
//! One long-lived task blocks on the read half of the server connection and
//! applies each complete frame to the shared session under its lock. The
//! only exit is the socket going away (EOF or a read error), which is a
//! normal lifecycle event, not a failure: the session ends in `GameOver`
//! and the task terminates without retrying.

use crate::game::{self, SharedSession};
use log::{debug, info, warn};
use shared::protocol::Message;
use shared::SessionPhase;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Runs until the server closes the connection. Generic over the reader so
/// tests can drive it with an in-memory pipe.
pub async fn run_sync_agent<R>(reader: R, session: SharedSession)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match Message::parse(&line) {
                Ok(message) => {
                    game::lock(&session).apply_message(&message);
                }
                Err(err) => {
                    debug!("Ignoring malformed frame {:?}: {}", line, err);
                }
            },
            Ok(None) => {
                info!("Server closed the connection");
                break;
            }
            Err(e) => {
                warn!("Receive failed: {}", e);
                break;
            }
        }
    }

    game::lock(&session).phase = SessionPhase::GameOver;
}
