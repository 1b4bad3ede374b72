//! Session slot management and the ready/start handshake
//!
//! This module is the server's authoritative bookkeeping for the two
//! participant slots:
//! - Slot lifecycle (claim, release) with a hard capacity of two
//! - Ready flags and the idempotent start check
//! - The authoritative health/score pair each participant self-reports
//!
//! It is pure state: no sockets, no locks, no tasks. The network layer owns
//! one `SessionManager` inside its event loop and asks it what to broadcast.

use log::info;
use shared::{SessionPhase, MAX_HEALTH, MAX_PLAYERS};
use std::net::SocketAddr;

/// One reserved position for a participant
///
/// Health and score are whatever the participant last self-reported via
/// `UPDATE`; the server stores and relays them but never simulates.
#[derive(Debug)]
pub struct Slot {
    /// Participant identity, 1 or 2
    pub id: u8,
    /// Network address, kept for log lines
    pub addr: SocketAddr,
    /// Whether this participant has sent READY
    pub ready: bool,
    /// Last self-reported health, clamped to [0, 100]
    pub health: f32,
    /// Last self-reported score
    pub score: u32,
}

impl Slot {
    fn new(id: u8, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            ready: false,
            health: MAX_HEALTH,
            score: 0,
        }
    }
}

/// Outcome of re-evaluating the start handshake after a connect or READY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCheck {
    /// Everyone is connected and ready; broadcast START exactly once.
    Started,
    /// Below capacity; broadcast WAITING.
    StillWaiting,
    /// Both slots taken but not everyone has sent READY; nothing to send.
    AwaitingReady,
    /// Session already running; never re-broadcast.
    AlreadyPlaying,
}

/// Bounded slot table plus the pair's phase machine.
pub struct SessionManager {
    slots: Vec<Slot>,
    phase: SessionPhase,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            phase: SessionPhase::Waiting,
        }
    }

    /// Claims the lowest free slot id. Returns None at capacity; a
    /// rejected connection never mutates the table.
    pub fn add_player(&mut self, addr: SocketAddr) -> Option<u8> {
        if self.is_full() {
            return None;
        }

        let id = (1..=MAX_PLAYERS as u8).find(|id| self.slots.iter().all(|s| s.id != *id))?;
        info!("Player {} connected from {}", id, addr);
        self.slots.push(Slot::new(id, addr));
        Some(id)
    }

    /// Releases a slot. Dropping below capacity resets the started flag,
    /// so the pair falls back to the ready handshake; the remaining
    /// participant's ready flag persists.
    pub fn remove_player(&mut self, id: u8) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        if self.slots.len() == before {
            return false;
        }

        info!("Player {} disconnected, {} remaining", id, self.slots.len());
        if self.slots.len() < MAX_PLAYERS {
            self.phase = SessionPhase::Waiting;
        }
        true
    }

    pub fn mark_ready(&mut self, id: u8) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.ready = true;
                true
            }
            None => false,
        }
    }

    /// Re-evaluates the start handshake. Only the transition into Playing
    /// reports `Started`, so START is broadcast at most once per session.
    pub fn check_start(&mut self) -> StartCheck {
        if self.phase == SessionPhase::Playing {
            return StartCheck::AlreadyPlaying;
        }
        if self.slots.len() < MAX_PLAYERS {
            return StartCheck::StillWaiting;
        }
        if self.slots.iter().all(|s| s.ready) {
            info!("All players ready, starting game");
            self.phase = SessionPhase::Playing;
            StartCheck::Started
        } else {
            StartCheck::AwaitingReady
        }
    }

    /// Stores a participant's self-reported state, both fields together.
    pub fn apply_update(&mut self, id: u8, health: f32, score: u32) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.health = health.clamp(0.0, MAX_HEALTH);
                slot.score = score;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: u8) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// Every connected id except `id`: the relay fan-out for STATE.
    pub fn peer_ids(&self, id: u8) -> Vec<u8> {
        self.slots
            .iter()
            .map(|s| s.id)
            .filter(|peer| *peer != id)
            .collect()
    }

    pub fn player_ids(&self) -> Vec<u8> {
        self.slots.iter().map(|s| s.id).collect()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_PLAYERS
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
