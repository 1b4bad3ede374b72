//! Per-participant stream of falling timed targets.
//!
//! The stream owns spawn cadence (with a difficulty ramp that only ever
//! shrinks the interval), movement, and expiry. Targets live in an
//! order-preserving deque: removal is stable compaction, never swap-remove,
//! because judging breaks distance ties toward the earliest-inserted target.

use rand::Rng;

use crate::{
    Lane, FIELD_HEIGHT, INITIAL_SPAWN_INTERVAL, JUDGMENT_LINE_Y, MAX_TARGETS, MIN_SPAWN_INTERVAL,
    SPAWN_INTERVAL_STEP, SPAWN_RAMP_INTERVAL, TARGET_SPAWN_Y, TARGET_SPEED,
};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub lane: Lane,
    pub y: f32,
}

impl Target {
    /// Absolute distance to the judgment line.
    pub fn distance(&self) -> f32 {
        (self.y - JUDGMENT_LINE_Y).abs()
    }
}

#[derive(Debug, Clone)]
pub struct TargetStream {
    targets: VecDeque<Target>,
    spawn_timer: f32,
    spawn_interval: f32,
    ramp_timer: f32,
}

impl TargetStream {
    pub fn new() -> Self {
        Self {
            targets: VecDeque::new(),
            spawn_timer: 0.0,
            spawn_interval: INITIAL_SPAWN_INTERVAL,
            ramp_timer: 0.0,
        }
    }

    /// Appends a target with a uniformly random lane above the visible
    /// area. No-op at capacity; returns whether a target was spawned.
    pub fn spawn(&mut self, rng: &mut impl Rng) -> bool {
        if self.targets.len() >= MAX_TARGETS {
            return false;
        }
        self.targets.push_back(Target {
            lane: rng.gen(),
            y: TARGET_SPAWN_Y,
        });
        true
    }

    /// Moves every live target down by `TARGET_SPEED * dt`.
    pub fn advance(&mut self, dt: f32) {
        for target in &mut self.targets {
            target.y += TARGET_SPEED * dt;
        }
    }

    /// Drops targets that passed the bottom of the field unhandled.
    /// Expiry has no scoring side effect; the count is returned so a
    /// frontend can still surface it.
    pub fn expire(&mut self) -> usize {
        let before = self.targets.len();
        self.targets.retain(|target| target.y <= FIELD_HEIGHT);
        before - self.targets.len()
    }

    /// Stable removal: the relative order of the remaining targets is
    /// unchanged.
    pub fn remove(&mut self, index: usize) -> Option<Target> {
        self.targets.remove(index)
    }

    /// Closest pending target in `lane`, as `(index, distance)`. Strict
    /// comparison keeps the earliest-inserted target on exact ties.
    pub fn closest_in_lane(&self, lane: Lane) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (index, target) in self.targets.iter().enumerate() {
            if target.lane != lane {
                continue;
            }
            let distance = target.distance();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best
    }

    /// One simulation step: spawn cadence, difficulty ramp, movement,
    /// expiry. Returns the number of targets that expired.
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) -> usize {
        self.spawn_timer += dt;
        self.ramp_timer += dt;

        if self.ramp_timer >= SPAWN_RAMP_INTERVAL {
            self.ramp_timer = 0.0;
            if self.spawn_interval > MIN_SPAWN_INTERVAL {
                self.spawn_interval =
                    (self.spawn_interval - SPAWN_INTERVAL_STEP).max(MIN_SPAWN_INTERVAL);
            }
        }

        if self.spawn_timer >= self.spawn_interval {
            self.spawn_timer = 0.0;
            self.spawn(rng);
        }

        self.advance(dt);
        self.expire()
    }

    /// Places a target directly; used by scripted scenarios and tests.
    pub fn push(&mut self, target: Target) {
        self.targets.push_back(target);
    }

    pub fn spawn_interval(&self) -> f32 {
        self.spawn_interval
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }
}

impl Default for TargetStream {
    fn default() -> Self {
        Self::new()
    }
}
