//! # Duel Client Library
//!
//! Client side of the two-player rhythm duel. Two concurrent activities
//! share one session: the simulation loop (spawn, advance, judge) and the
//! sync agent (receive, parse, apply), serialized by a single mutex so the
//! score/health pair of either participant is never seen half-updated.
//!
//! ## Module Organization
//!
//! - [`game`]: the shared `SessionState` with protocol frame application,
//!   the per-tick simulation step, and the render snapshot a frontend draws.
//! - [`sync`]: the sync agent task, a blocking line receive on the server
//!   connection applied under the session lock; EOF means `GameOver`.
//! - [`input`]: the seam for "a discrete lane press this tick"; keyboard
//!   polling plugs in from outside, bots and tests use the sources here.
//! - [`network`]: connection setup, the outbound writer task, and the
//!   60 Hz simulation driver.

pub mod game;
pub mod input;
pub mod network;
pub mod sync;
