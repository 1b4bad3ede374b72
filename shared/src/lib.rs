use rand::distributions::{Distribution, Standard};
use rand::Rng;

pub mod judge;
pub mod protocol;
pub mod targets;

pub use targets::{Target, TargetStream};

pub const JUDGMENT_LINE_Y: f32 = 600.0;
pub const FIELD_HEIGHT: f32 = 720.0;
pub const TARGET_SPAWN_Y: f32 = -50.0;
pub const TARGET_SPEED: f32 = 300.0;
pub const PERFECT_WINDOW: f32 = 25.0;
pub const GOOD_WINDOW: f32 = 50.0;
pub const PERFECT_SCORE: u32 = 100;
pub const GOOD_SCORE: u32 = 50;
pub const PERFECT_DAMAGE: f32 = 10.0;
pub const MAX_HEALTH: f32 = 100.0;
pub const MAX_TARGETS: usize = 100;
pub const INITIAL_SPAWN_INTERVAL: f32 = 2.0;
pub const SPAWN_RAMP_INTERVAL: f32 = 15.0;
pub const SPAWN_INTERVAL_STEP: f32 = 0.5;
pub const MIN_SPAWN_INTERVAL: f32 = 0.5;
pub const MAX_PLAYERS: usize = 2;

/// One of the four directions a target can fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Up,
    Down,
    Left,
    Right,
}

impl Distribution<Lane> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Lane {
        match rng.gen_range(0..4) {
            0 => Lane::Up,
            1 => Lane::Down,
            2 => Lane::Left,
            _ => Lane::Right,
        }
    }
}

/// Session lifecycle. The variant order defines the forward direction of
/// the state machine; the server and both clients each track their own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Connecting,
    Waiting,
    Ready,
    Playing,
    GameOver,
}

impl SessionPhase {
    /// Forward-only transition. Returns true if the phase actually moved,
    /// which keeps repeated START deliveries and double-READY idempotent.
    pub fn advance(&mut self, to: SessionPhase) -> bool {
        if to > *self {
            *self = to;
            true
        } else {
            false
        }
    }
}

/// Label for the most recently judged input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComboLabel {
    #[default]
    None,
    Perfect,
    Good,
    Miss,
}

/// One participant's record: identity, the score/health pair, and the
/// target stream their inputs are judged against.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: u8,
    pub score: u32,
    pub health: f32,
    pub combo: ComboLabel,
    pub perfect_count: u32,
    pub targets: TargetStream,
}

impl PlayerState {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            score: 0,
            health: MAX_HEALTH,
            combo: ComboLabel::None,
            perfect_count: 0,
            targets: TargetStream::new(),
        }
    }

    pub fn apply_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).clamp(0.0, MAX_HEALTH);
    }

    /// Applies a relayed state delta. Health and score change together so
    /// no reader observes a half-applied update.
    pub fn apply_remote(&mut self, health: f32, score: u32) {
        self.health = health.clamp(0.0, MAX_HEALTH);
        self.score = score;
    }

    /// Session reset: the one place score and perfect_count may go down.
    pub fn reset(&mut self) {
        self.score = 0;
        self.health = MAX_HEALTH;
        self.combo = ComboLabel::None;
        self.perfect_count = 0;
        self.targets = TargetStream::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_player_creation() {
        let player = PlayerState::new(1);
        assert_eq!(player.id, 1);
        assert_eq!(player.score, 0);
        assert_eq!(player.health, MAX_HEALTH);
        assert_eq!(player.combo, ComboLabel::None);
        assert_eq!(player.perfect_count, 0);
        assert!(player.targets.is_empty());
    }

    #[test]
    fn test_damage_is_clamped_at_zero() {
        let mut player = PlayerState::new(2);
        player.apply_damage(30.0);
        assert_approx_eq!(player.health, 70.0, 0.001);

        player.apply_damage(80.0);
        assert_eq!(player.health, 0.0);

        player.apply_damage(10.0);
        assert_eq!(player.health, 0.0);
    }

    #[test]
    fn test_apply_remote_sets_both_fields() {
        let mut player = PlayerState::new(2);
        player.apply_remote(62.5, 450);
        assert_approx_eq!(player.health, 62.5, 0.001);
        assert_eq!(player.score, 450);

        // out-of-range health from a peer is clamped, never stored raw
        player.apply_remote(250.0, 500);
        assert_eq!(player.health, MAX_HEALTH);
        player.apply_remote(-5.0, 500);
        assert_eq!(player.health, 0.0);
    }

    #[test]
    fn test_reset_restores_initial_record() {
        let mut player = PlayerState::new(1);
        player.score = 300;
        player.health = 40.0;
        player.combo = ComboLabel::Perfect;
        player.perfect_count = 3;

        player.reset();
        assert_eq!(player.score, 0);
        assert_eq!(player.health, MAX_HEALTH);
        assert_eq!(player.combo, ComboLabel::None);
        assert_eq!(player.perfect_count, 0);
    }

    #[test]
    fn test_phase_advances_forward_only() {
        let mut phase = SessionPhase::Connecting;
        assert!(phase.advance(SessionPhase::Waiting));
        assert!(phase.advance(SessionPhase::Playing));
        assert_eq!(phase, SessionPhase::Playing);

        // repeated START delivery is a no-op
        assert!(!phase.advance(SessionPhase::Playing));
        // and the machine never rolls back through advance
        assert!(!phase.advance(SessionPhase::Waiting));
        assert_eq!(phase, SessionPhase::Playing);
    }

    #[test]
    fn test_lane_sampling_covers_all_lanes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 4];
        for _ in 0..200 {
            match rng.gen::<Lane>() {
                Lane::Up => seen[0] = true,
                Lane::Down => seen[1] = true,
                Lane::Left => seen[2] = true,
                Lane::Right => seen[3] = true,
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
