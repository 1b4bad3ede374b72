//! # Rendezvous Server Library
//!
//! Server side of the two-player rhythm duel. The server never simulates
//! gameplay; it owns the session handshake and relays state between the
//! participants.
//!
//! ## Responsibilities
//!
//! - Accept at most two connections, assign identities (`ID 1` / `ID 2`),
//!   and reject anyone else with `Server full` before an identity exists.
//! - Track the ready flags and broadcast `START` exactly once when both
//!   participants have sent `READY`.
//! - Store each participant's self-reported health/score from `UPDATE`
//!   frames and relay them as `STATE` to the other participant only.
//! - Treat a closed connection as a normal lifecycle event: free the slot,
//!   reset the started flag, and send the survivor back to `WAITING`.
//!
//! ## Architecture
//!
//! One event loop owns all session state (`session::SessionManager`).
//! Per-connection reader tasks parse text frames and forward typed events
//! over a channel; per-connection writer tasks drain outbound line queues.
//! Nothing here shares a lock, and a slow or dead peer can only stall its
//! own writer task, never the session loop.

pub mod network;
pub mod session;
