//! Input seam between the simulation and whatever produces lane presses.
//!
//! Keyboard polling lives outside the core; the simulation only asks for
//! "the lane pressed this tick, if any". The sources here cover scripted
//! playback for tests and a random source for the headless bot.

use rand::Rng;
use shared::Lane;
use std::collections::VecDeque;

pub trait InputSource {
    /// The lane pressed this tick, if any.
    fn poll(&mut self) -> Option<Lane>;
}

/// Plays back a fixed per-tick script; `None` entries are idle ticks.
pub struct ScriptedInput {
    events: VecDeque<Option<Lane>>,
}

impl ScriptedInput {
    pub fn new<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Option<Lane>>,
    {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Option<Lane> {
        self.events.pop_front().flatten()
    }
}

/// Presses a uniformly random lane with a fixed per-tick probability.
pub struct RandomInput<R: Rng> {
    rng: R,
    press_chance: f64,
}

impl<R: Rng> RandomInput<R> {
    pub fn new(rng: R, press_chance: f64) -> Self {
        Self {
            rng,
            press_chance: press_chance.clamp(0.0, 1.0),
        }
    }
}

impl<R: Rng> InputSource for RandomInput<R> {
    fn poll(&mut self) -> Option<Lane> {
        if self.rng.gen_bool(self.press_chance) {
            Some(self.rng.gen())
        } else {
            None
        }
    }
}
