//! Entity store: canonical passenger/trike records and the status
//! partitions derived from them.
//!
//! The store is the single owner of simulation truth. Status sets form an
//! exact partition — every loaded passenger id sits in exactly one of the
//! four passenger sets, every registered trike id in exactly one of the
//! three trike sets; a transition is an atomic remove-from-all plus
//! add-to-one. Other components mutate state only through the methods here.

use std::collections::{BTreeMap, HashMap, HashSet};

use bevy_ecs::prelude::{Entity, Resource};
use serde_json::Value;

use crate::clock::Frame;
use crate::ecs::{PassengerStatus, TrikeStatus};
use crate::events::{EventKind, SimEvent};
use crate::geo::Point;

/// Canonical passenger record; immutable once loaded. Status lives in the
/// store's partitions, not on the record.
#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: String,
    pub src: Point,
    pub dest: Point,
    pub create_time: Frame,
    /// `None` means "never" (wire value -1).
    pub death_time: Option<Frame>,
    pub events: Vec<SimEvent>,
}

/// Fixed station location; loaded and displayed, never mutated.
#[derive(Debug, Clone)]
pub struct Terminal {
    pub id: String,
    pub location: Point,
    pub remaining_passengers: u64,
    pub remaining_tricycles: u64,
}

/// Sorted id lists per partition, handed to the presentation sink whenever
/// membership changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSnapshot {
    pub waiting: Vec<String>,
    pub enqueued: Vec<String>,
    pub onboard: Vec<String>,
    pub completed: Vec<String>,
    pub trikes_default: Vec<String>,
    pub trikes_enqueueing: Vec<String>,
    pub trikes_serving: Vec<String>,
}

#[derive(Debug, Default, Resource)]
pub struct EntityStore {
    passengers: HashMap<String, Passenger>,
    /// Passenger ids not yet announced, keyed by the frame of their own
    /// APPEAR event (create time when the record carries none).
    pending_appearances: BTreeMap<Frame, Vec<String>>,
    waiting: HashSet<String>,
    enqueued: HashSet<String>,
    onboard: HashSet<String>,
    completed: HashSet<String>,
    /// Registration order doubles as the fixed per-tick enumeration order.
    trike_order: Vec<(String, Entity)>,
    trike_entities: HashMap<String, Entity>,
    trikes_default: HashSet<String>,
    trikes_enqueueing: HashSet<String>,
    trikes_serving: HashSet<String>,
    trike_passengers: HashMap<String, HashSet<String>>,
    terminals: Vec<Terminal>,
    metadata: Vec<Value>,
    /// Highest frame any trike's animator has processed.
    frame_watermark: Frame,
    /// Bumped on every partition mutation; lets the router emit one status
    /// snapshot per tick only when something moved.
    revision: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canonical passenger mapping. Records with an empty id are
    /// skipped with a warning; everything loaded starts Waiting.
    pub fn load_passengers(&mut self, list: Vec<Passenger>) {
        self.passengers.clear();
        self.pending_appearances.clear();
        self.waiting.clear();
        self.enqueued.clear();
        self.onboard.clear();
        self.completed.clear();

        for passenger in list {
            if passenger.id.is_empty() {
                eprintln!("WARNING: skipping passenger record with empty id");
                continue;
            }
            let appear_frame = passenger
                .events
                .iter()
                .find_map(|event| match event.kind {
                    EventKind::Appear { .. } => Some(event.time),
                    _ => None,
                })
                .unwrap_or(passenger.create_time);
            self.waiting.insert(passenger.id.clone());
            self.pending_appearances
                .entry(appear_frame)
                .or_default()
                .push(passenger.id.clone());
            self.passengers.insert(passenger.id.clone(), passenger);
        }
        self.revision += 1;
    }

    pub fn passenger(&self, id: &str) -> Option<&Passenger> {
        self.passengers.get(id)
    }

    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }

    /// Drain passenger ids whose appearance is due at or before `frame`.
    /// Each id comes back exactly once, in appearance-frame order. The
    /// initial population appears at frame 0 and the first processed frame
    /// is 1, so the drain is at-or-before, not exact-match.
    pub fn drain_appearances_through(&mut self, frame: Frame) -> Vec<String> {
        let later = match frame.checked_add(1) {
            Some(next) => self.pending_appearances.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.pending_appearances, later);
        due.into_values().flatten().collect()
    }

    pub fn passenger_status(&self, id: &str) -> Option<PassengerStatus> {
        if self.waiting.contains(id) {
            Some(PassengerStatus::Waiting)
        } else if self.enqueued.contains(id) {
            Some(PassengerStatus::Enqueued)
        } else if self.onboard.contains(id) {
            Some(PassengerStatus::Onboard)
        } else if self.completed.contains(id) {
            Some(PassengerStatus::Completed)
        } else {
            None
        }
    }

    /// Atomic move between passenger partitions. Unknown ids and backward
    /// transitions are a no-op with a warning.
    pub fn set_passenger_status(&mut self, id: &str, status: PassengerStatus) {
        let Some(current) = self.passenger_status(id) else {
            eprintln!("WARNING: set_passenger_status for untracked passenger '{id}'");
            return;
        };
        if status < current {
            eprintln!(
                "WARNING: ignoring backward passenger transition {current:?} -> {status:?} for '{id}'"
            );
            return;
        }
        if status == current {
            return;
        }
        self.waiting.remove(id);
        self.enqueued.remove(id);
        self.onboard.remove(id);
        self.completed.remove(id);
        match status {
            PassengerStatus::Waiting => self.waiting.insert(id.to_owned()),
            PassengerStatus::Enqueued => self.enqueued.insert(id.to_owned()),
            PassengerStatus::Onboard => self.onboard.insert(id.to_owned()),
            PassengerStatus::Completed => self.completed.insert(id.to_owned()),
        };
        self.revision += 1;
    }

    /// Register a trike id with its ECS entity. Returns `false` (no-op) if
    /// the id is already registered — the duplicate-initialization guard.
    pub fn register_trike(&mut self, id: &str, entity: Entity) -> bool {
        if self.trike_entities.contains_key(id) {
            eprintln!("WARNING: trike '{id}' already registered, ignoring duplicate");
            return false;
        }
        self.trike_entities.insert(id.to_owned(), entity);
        self.trike_order.push((id.to_owned(), entity));
        self.trikes_default.insert(id.to_owned());
        self.trike_passengers.insert(id.to_owned(), HashSet::new());
        self.revision += 1;
        true
    }

    /// Registered trikes in their fixed enumeration order.
    pub fn trikes(&self) -> &[(String, Entity)] {
        &self.trike_order
    }

    pub fn trike_entity(&self, id: &str) -> Option<Entity> {
        self.trike_entities.get(id).copied()
    }

    pub fn trike_status(&self, id: &str) -> Option<TrikeStatus> {
        if self.trikes_default.contains(id) {
            Some(TrikeStatus::Default)
        } else if self.trikes_enqueueing.contains(id) {
            Some(TrikeStatus::Enqueueing)
        } else if self.trikes_serving.contains(id) {
            Some(TrikeStatus::Serving)
        } else {
            None
        }
    }

    /// Atomic move between trike partitions; unknown ids warn and no-op.
    pub fn set_trike_status(&mut self, id: &str, status: TrikeStatus) {
        let Some(current) = self.trike_status(id) else {
            eprintln!("WARNING: set_trike_status for unregistered trike '{id}'");
            return;
        };
        if status == current {
            return;
        }
        self.trikes_default.remove(id);
        self.trikes_enqueueing.remove(id);
        self.trikes_serving.remove(id);
        match status {
            TrikeStatus::Default => self.trikes_default.insert(id.to_owned()),
            TrikeStatus::Enqueueing => self.trikes_enqueueing.insert(id.to_owned()),
            TrikeStatus::Serving => self.trikes_serving.insert(id.to_owned()),
        };
        self.revision += 1;
    }

    pub fn trike_passengers(&self, id: &str) -> Option<&HashSet<String>> {
        self.trike_passengers.get(id)
    }

    /// Replace a trike's onboard set and re-derive its status: non-empty ⇒
    /// Serving, empty ⇒ Default — except that an explicit Enqueueing set by
    /// the router survives an empty set.
    pub fn record_trike_passengers(&mut self, id: &str, passengers: HashSet<String>) {
        if !self.trike_entities.contains_key(id) {
            eprintln!("WARNING: record_trike_passengers for unregistered trike '{id}'");
            return;
        }
        let derived = if passengers.is_empty() {
            match self.trike_status(id) {
                Some(TrikeStatus::Enqueueing) => TrikeStatus::Enqueueing,
                _ => TrikeStatus::Default,
            }
        } else {
            TrikeStatus::Serving
        };
        self.trike_passengers.insert(id.to_owned(), passengers);
        self.set_trike_status(id, derived);
    }

    /// Record the highest frame any trike has reached; monotonic. This is
    /// the UI frame counter, distinct from the wall-clock tick count.
    pub fn advance_frame_watermark(&mut self, frame: Frame) {
        if frame > self.frame_watermark {
            self.frame_watermark = frame;
        }
    }

    pub fn frame_watermark(&self) -> Frame {
        self.frame_watermark
    }

    pub fn set_terminals(&mut self, terminals: Vec<Terminal>) {
        self.terminals = terminals;
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn set_metadata(&mut self, metadata: Vec<Value>) {
        self.metadata = metadata;
    }

    /// Free-form summary records, displayed verbatim.
    pub fn metadata(&self) -> &[Value] {
        &self.metadata
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn partition_snapshot(&self) -> PartitionSnapshot {
        fn sorted(set: &HashSet<String>) -> Vec<String> {
            let mut ids: Vec<String> = set.iter().cloned().collect();
            ids.sort();
            ids
        }
        PartitionSnapshot {
            waiting: sorted(&self.waiting),
            enqueued: sorted(&self.enqueued),
            onboard: sorted(&self.onboard),
            completed: sorted(&self.completed),
            trikes_default: sorted(&self.trikes_default),
            trikes_enqueueing: sorted(&self.trikes_enqueueing),
            trikes_serving: sorted(&self.trikes_serving),
        }
    }

    /// Clear every record and partition back to empty. Idempotent.
    pub fn reset(&mut self) {
        self.passengers.clear();
        self.pending_appearances.clear();
        self.waiting.clear();
        self.enqueued.clear();
        self.onboard.clear();
        self.completed.clear();
        self.trike_order.clear();
        self.trike_entities.clear();
        self.trikes_default.clear();
        self.trikes_enqueueing.clear();
        self.trikes_serving.clear();
        self.trike_passengers.clear();
        self.terminals.clear();
        self.metadata.clear();
        self.frame_watermark = 0;
        self.revision += 1;
    }
}
