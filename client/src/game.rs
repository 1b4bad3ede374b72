//! Client-side session state shared between the simulation loop and the
//! sync agent.
//!
//! One mutex guards the whole `SessionState`; every tick update and every
//! applied protocol frame is a single critical section, so the score/health
//! pair of a participant is never observed half-written. Critical sections
//! never touch the socket; outbound frames are returned to the caller and
//! queued for the writer task.

use log::{debug, info};
use rand::Rng;
use shared::judge::{self, Tier};
use shared::protocol::Message;
use shared::{ComboLabel, Lane, PlayerState, SessionPhase};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SharedSession = Arc<Mutex<SessionState>>;

/// Acquires the session lock. A poisoned lock means a panicked holder;
/// the state itself is still the best copy we have.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, SessionState> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a frontend draws for one frame.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    pub phase: SessionPhase,
    pub local_id: u8,
    pub local_score: u32,
    pub local_health: f32,
    pub local_combo: ComboLabel,
    pub local_perfects: u32,
    pub remote_score: u32,
    pub remote_health: f32,
    pub targets: Vec<(Lane, f32)>,
}

/// The mutually-visible pair of participant records plus the session phase.
#[derive(Debug)]
pub struct SessionState {
    pub local: PlayerState,
    pub remote: PlayerState,
    pub phase: SessionPhase,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            local: PlayerState::new(1),
            remote: PlayerState::new(2),
            phase: SessionPhase::Connecting,
        }
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Applies one server frame. Runs on the receive path with the session
    /// lock held by the caller.
    pub fn apply_message(&mut self, message: &Message) {
        match message {
            Message::Id(id) => {
                self.local.id = *id;
                self.remote.id = if *id == 1 { 2 } else { 1 };
                self.phase.advance(SessionPhase::Waiting);
                info!("Assigned as player {}", id);
            }

            Message::Waiting => {
                if self.phase == SessionPhase::Playing {
                    // the opponent is gone; back to the ready handshake
                    info!("Opponent left, waiting for a new player");
                    self.phase = SessionPhase::Waiting;
                }
            }

            Message::Start => {
                if self.phase.advance(SessionPhase::Playing) {
                    info!("Both players ready, game on");
                }
            }

            Message::State { id, health, score } => {
                // only the opponent's record is ours to overwrite
                if *id != self.local.id {
                    self.remote.apply_remote(*health, *score);
                }
            }

            Message::ServerFull => {
                info!("Server full, session over");
                self.phase = SessionPhase::GameOver;
            }

            // client-to-server verbs never arrive here
            Message::Ready | Message::Update { .. } => {
                debug!("Ignoring client-bound frame: {:?}", message);
            }
        }
    }

    /// Records that READY went out; the server confirms with START.
    pub fn mark_ready(&mut self) {
        self.phase.advance(SessionPhase::Ready);
    }

    /// One simulation step: target stream update, at most one judged lane
    /// press, and the game-over check. Returns the frame to send, if the
    /// press scored.
    pub fn tick(&mut self, dt: f32, input: Option<Lane>, rng: &mut impl Rng) -> Option<Message> {
        if self.phase != SessionPhase::Playing {
            return None;
        }

        self.local.targets.update(dt, rng);

        let mut outbound = None;
        if let Some(lane) = input {
            match judge::judge(&mut self.local, &mut self.remote, lane) {
                Tier::Perfect | Tier::Good => {
                    outbound = Some(Message::Update {
                        health: self.local.health,
                        score: self.local.score,
                    });
                }
                Tier::Miss => {}
            }
        }

        if self.local.health <= 0.0 || self.remote.health <= 0.0 {
            info!(
                "Match over: {} hp vs {} hp",
                self.local.health, self.remote.health
            );
            self.phase = SessionPhase::GameOver;
        }

        outbound
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            phase: self.phase,
            local_id: self.local.id,
            local_score: self.local.score,
            local_health: self.local.health,
            local_combo: self.local.combo,
            local_perfects: self.local.perfect_count,
            remote_score: self.remote.score,
            remote_health: self.remote.health,
            targets: self.local.targets.iter().map(|t| (t.lane, t.y)).collect(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{Target, JUDGMENT_LINE_Y, MAX_HEALTH, PERFECT_DAMAGE};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn playing_state() -> SessionState {
        let mut state = SessionState::new();
        state.apply_message(&Message::Id(1));
        state.apply_message(&Message::Start);
        state
    }

    #[test]
    fn test_identity_assignment_sets_both_ids() {
        let mut state = SessionState::new();
        state.apply_message(&Message::Id(2));

        assert_eq!(state.local.id, 2);
        assert_eq!(state.remote.id, 1);
        assert_eq!(state.phase, SessionPhase::Waiting);
    }

    #[test]
    fn test_start_is_idempotent_and_keeps_scores() {
        let mut state = playing_state();
        state.local.score = 250;
        state.remote.health = 70.0;

        state.apply_message(&Message::Start);

        assert_eq!(state.phase, SessionPhase::Playing);
        assert_eq!(state.local.score, 250);
        assert_approx_eq!(state.remote.health, 70.0, 0.001);
    }

    #[test]
    fn test_state_frame_applies_to_remote_only() {
        let mut state = playing_state();
        state.apply_message(&Message::State {
            id: 2,
            health: 55.0,
            score: 400,
        });

        assert_approx_eq!(state.remote.health, 55.0, 0.001);
        assert_eq!(state.remote.score, 400);
        assert_eq!(state.local.health, MAX_HEALTH);
        assert_eq!(state.local.score, 0);
    }

    #[test]
    fn test_state_frame_about_local_id_is_ignored() {
        let mut state = playing_state();
        state.apply_message(&Message::State {
            id: 1,
            health: 10.0,
            score: 999,
        });

        assert_eq!(state.local.health, MAX_HEALTH);
        assert_eq!(state.local.score, 0);
        assert_eq!(state.remote.health, MAX_HEALTH);
        assert_eq!(state.remote.score, 0);
    }

    #[test]
    fn test_waiting_drops_a_live_session() {
        let mut state = playing_state();
        state.apply_message(&Message::Waiting);
        assert_eq!(state.phase, SessionPhase::Waiting);
    }

    #[test]
    fn test_waiting_before_start_is_informational() {
        let mut state = SessionState::new();
        state.apply_message(&Message::Id(1));
        state.mark_ready();

        state.apply_message(&Message::Waiting);
        assert_eq!(state.phase, SessionPhase::Ready);
    }

    #[test]
    fn test_tick_is_inert_outside_playing() {
        let mut state = SessionState::new();
        state.apply_message(&Message::Id(1));

        let out = state.tick(1.0 / 60.0, Some(Lane::Up), &mut rng());
        assert!(out.is_none());
        assert!(state.local.targets.is_empty());
    }

    #[test]
    fn test_scoring_tick_produces_update_frame() {
        let mut state = playing_state();
        state.local.targets.push(Target {
            lane: Lane::Up,
            y: JUDGMENT_LINE_Y,
        });

        let out = state.tick(0.0, Some(Lane::Up), &mut rng());

        match out {
            Some(Message::Update { health, score }) => {
                // the frame carries our own authoritative pair
                assert_eq!(health, MAX_HEALTH);
                assert_eq!(score, 100);
            }
            other => panic!("expected an UPDATE frame, got {:?}", other),
        }
        assert_approx_eq!(state.remote.health, MAX_HEALTH - PERFECT_DAMAGE, 0.001);
    }

    #[test]
    fn test_missed_press_sends_nothing() {
        let mut state = playing_state();
        let out = state.tick(0.0, Some(Lane::Left), &mut rng());
        assert!(out.is_none());
        assert_eq!(state.local.combo, ComboLabel::Miss);
    }

    #[test]
    fn test_zero_remote_health_ends_the_match() {
        let mut state = playing_state();
        state.remote.health = PERFECT_DAMAGE;
        state.local.targets.push(Target {
            lane: Lane::Down,
            y: JUDGMENT_LINE_Y,
        });

        let out = state.tick(0.0, Some(Lane::Down), &mut rng());
        assert!(out.is_some());
        assert_eq!(state.remote.health, 0.0);
        assert_eq!(state.phase, SessionPhase::GameOver);
    }

    #[test]
    fn test_snapshot_reflects_the_session() {
        let mut state = playing_state();
        state.local.score = 150;
        state.local.targets.push(Target {
            lane: Lane::Right,
            y: 123.0,
        });

        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Playing);
        assert_eq!(snapshot.local_id, 1);
        assert_eq!(snapshot.local_score, 150);
        assert_eq!(snapshot.targets, vec![(Lane::Right, 123.0)]);
    }
}
