//! ECS components and status enums for replayed entities.
//!
//! A trike entity carries two components: the immutable [`TrikeAgent`]
//! record loaded from the bundle, and the [`PathCursor`] the animator owns.
//! Cursor indices only ever move forward.

use bevy_ecs::prelude::Component;

use crate::clock::Frame;
use crate::events::SimEvent;
use crate::geo::Point;

/// Passenger lifecycle, strictly forward: Waiting → Enqueued → Onboard → Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassengerStatus {
    Waiting,
    Enqueued,
    Onboard,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrikeStatus {
    Default,
    /// Transient override while heading to pick up an enqueued passenger.
    Enqueueing,
    Serving,
}

/// Immutable trike record as loaded from the bundle.
#[derive(Debug, Clone, Component)]
pub struct TrikeAgent {
    pub id: String,
    /// Coordinate units travelled per millisecond of wall time.
    pub speed: f64,
    pub create_time: Frame,
    /// Time-ordered; the router and animator scan it monotonically.
    pub events: Vec<SimEvent>,
}

/// Animator state machine per trike. Positioning happens at most once;
/// Finished is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimPhase {
    Uninitialized,
    Positioned,
    Animating,
    Finished,
}

/// Animator-owned per-trike cursor: the validated path, the segment and
/// event positions within it, and the interpolated marker position.
#[derive(Debug, Clone, Component)]
pub struct PathCursor {
    pub phase: AnimPhase,
    pub path: Vec<Point>,
    pub path_index: usize,
    pub event_index: usize,
    pub last_processed_frame: Frame,
    /// `None` until the trike has been positioned.
    pub position: Option<Point>,
    /// Distance accumulated into the current segment across ticks.
    pub segment_travelled: f64,
    /// Remaining wall time of the active WAIT event, if one is counting down.
    pub wait_remaining_ms: Option<f64>,
    /// Remaining segment count of the active MOVE event, if one is armed.
    pub move_steps_left: Option<u32>,
}

impl PathCursor {
    pub fn new(path: Vec<Point>) -> Self {
        Self {
            phase: AnimPhase::Uninitialized,
            path,
            path_index: 0,
            event_index: 0,
            last_processed_frame: 0,
            position: None,
            segment_travelled: 0.0,
            wait_remaining_ms: None,
            move_steps_left: None,
        }
    }

    /// Place the trike at the start of its path. A trike may only be
    /// positioned once; repeat calls (duplicate load messages) are a no-op.
    /// A cursor with no valid points never leaves Uninitialized.
    pub fn position_once(&mut self) -> bool {
        if self.phase != AnimPhase::Uninitialized || self.path.is_empty() {
            return false;
        }
        self.position = Some(self.path[0]);
        self.phase = if self.path.len() > 1 {
            AnimPhase::Positioned
        } else {
            // A single-point path has nowhere to go.
            AnimPhase::Finished
        };
        true
    }

    pub fn at_path_end(&self) -> bool {
        self.path_index + 1 >= self.path.len()
    }
}
