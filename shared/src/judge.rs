//! Timing-window judgment for directional inputs.
//!
//! An input event selects the closest pending target in its lane and is
//! classified by distance to the judgment line. Windows are checked
//! narrowest-first so a perfect hit can never fall through as merely good.

use crate::{
    ComboLabel, Lane, PlayerState, GOOD_SCORE, GOOD_WINDOW, PERFECT_DAMAGE, PERFECT_SCORE,
    PERFECT_WINDOW,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Perfect,
    Good,
    Miss,
}

/// Distance-to-line classification. Boundary values resolve to the
/// stricter (lower) tier.
pub fn classify(distance: f32) -> Tier {
    if distance < PERFECT_WINDOW {
        Tier::Perfect
    } else if distance < GOOD_WINDOW {
        Tier::Good
    } else {
        Tier::Miss
    }
}

/// Judges one lane press for `attacker` against their own target stream.
///
/// Perfect: +100 score, perfect counter, fixed damage to `defender`
/// (clamped at 0). Good: +50 score. Miss: combo label only; no target is
/// consumed, whether the lane was empty or the candidate was out of
/// window. Perfect and Good consume the candidate and oblige the caller
/// to send an UPDATE with the attacker's new health/score pair.
pub fn judge(attacker: &mut PlayerState, defender: &mut PlayerState, lane: Lane) -> Tier {
    let (index, distance) = match attacker.targets.closest_in_lane(lane) {
        Some(candidate) => candidate,
        None => {
            attacker.combo = ComboLabel::Miss;
            return Tier::Miss;
        }
    };

    let tier = classify(distance);
    match tier {
        Tier::Perfect => {
            attacker.score += PERFECT_SCORE;
            attacker.perfect_count += 1;
            attacker.combo = ComboLabel::Perfect;
            defender.apply_damage(PERFECT_DAMAGE);
            attacker.targets.remove(index);
        }
        Tier::Good => {
            attacker.score += GOOD_SCORE;
            attacker.combo = ComboLabel::Good;
            attacker.targets.remove(index);
        }
        Tier::Miss => {
            attacker.combo = ComboLabel::Miss;
        }
    }
    tier
}
