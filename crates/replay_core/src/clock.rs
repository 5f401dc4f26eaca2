//! Simulation clock: a monotonic frame counter advanced by a fixed-interval
//! wall-clock tick, with a pause gate and a speed multiplier.
//!
//! The clock is an explicit [`Resource`] handed to systems — there is no
//! ambient global time. While paused, [`SimulationClock::tick`] consumes no
//! frames, so resuming never skips a frame.

use bevy_ecs::prelude::Resource;

/// Discrete simulation time unit; bundle timestamps are frame counts.
pub type Frame = u64;

/// Wall-clock interval between scheduler ticks.
pub const TICK_INTERVAL_MS: u64 = 25;

/// Milliseconds of simulated time one frame stands for; fixed by the
/// generator that produced the event log.
pub const MS_PER_FRAME: u64 = 1000;

/// One advancement of the clock: the frame just entered and the wall time
/// that elapsed producing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub frame: Frame,
    pub elapsed_ms: u64,
}

/// The tick currently being processed, inserted by the runner before each
/// schedule pass.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentTick(pub Tick);

#[derive(Debug, Resource)]
pub struct SimulationClock {
    frame: Frame,
    paused: bool,
    /// Scales per-tick travel distance. Present in state with no external
    /// control surface wired to it; defaults to 1.
    speed_multiplier: f64,
    tick_interval_ms: u64,
    ms_per_frame: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            frame: 0,
            paused: false,
            speed_multiplier: 1.0,
            tick_interval_ms: TICK_INTERVAL_MS,
            ms_per_frame: MS_PER_FRAME,
        }
    }
}

impl SimulationClock {
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Advance one tick. Returns `None` while paused: the pause gate defers
    /// the entire tick rather than partially applying it.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.paused {
            return None;
        }
        self.frame += 1;
        Some(Tick {
            frame: self.frame,
            elapsed_ms: self.tick_interval_ms,
        })
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// Convert a bundle frame count to milliseconds of simulated time.
    pub fn frame_to_ms(&self, frame: Frame) -> u64 {
        frame.saturating_mul(self.ms_per_frame)
    }

    /// Rewind to frame zero and unpause. Used by full replay reset only.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.paused = false;
    }
}
