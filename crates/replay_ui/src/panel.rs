//! Presentation state fed by the replay core.
//!
//! [`PanelSink`] is the crate's [`PresentationSink`]: every callback folds
//! into a [`PanelState`] behind a mutex, and the egui layer reads that state
//! once per repaint. The core stays unaware of egui entirely.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use replay_core::clock::Frame;
use replay_core::geo::Point;
use replay_core::sink::{ConnectorKind, PresentationSink};
use replay_core::store::PartitionSnapshot;

/// Cap on retained log lines; older entries fall off the front.
const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct Marker {
    pub at: Point,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub frame: Frame,
    pub entity: String,
    pub kind: String,
    pub detail: String,
}

#[derive(Debug, Default)]
pub struct PanelState {
    pub markers: HashMap<String, Marker>,
    pub enqueue_lines: HashMap<String, (Point, Point)>,
    pub destination_lines: HashMap<String, (Point, Point)>,
    pub snapshot: PartitionSnapshot,
    pub log: VecDeque<LogLine>,
    bounds: Option<(Point, Point)>,
}

impl PanelState {
    /// Min/max corners over every point ever shown, for map projection.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        self.bounds
    }

    fn grow_bounds(&mut self, point: Point) {
        let (min, max) = self.bounds.get_or_insert((point, point));
        min.lng = min.lng.min(point.lng);
        min.lat = min.lat.min(point.lat);
        max.lng = max.lng.max(point.lng);
        max.lat = max.lat.max(point.lat);
    }

    fn push_log(&mut self, line: LogLine) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.enqueue_lines.clear();
        self.destination_lines.clear();
        self.snapshot = PartitionSnapshot::default();
        self.log.clear();
        self.bounds = None;
    }
}

/// Shared handle kept by both the app and the replay world.
#[derive(Debug, Clone, Default)]
pub struct PanelSink {
    state: Arc<Mutex<PanelState>>,
}

impl PanelSink {
    pub fn read(&self) -> std::sync::MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PresentationSink for PanelSink {
    fn on_entity_appear(&self, id: &str, at: Point, label: &str) {
        let mut state = self.read();
        state.grow_bounds(at);
        state.markers.insert(
            id.to_owned(),
            Marker {
                at,
                label: label.to_owned(),
            },
        );
    }

    fn on_status_changed(&self, snapshot: &PartitionSnapshot) {
        self.read().snapshot = snapshot.clone();
    }

    fn on_trike_moved(&self, id: &str, at: Point) {
        let mut state = self.read();
        state.grow_bounds(at);
        match state.markers.get_mut(id) {
            Some(marker) => marker.at = at,
            None => {
                state.markers.insert(
                    id.to_owned(),
                    Marker {
                        at,
                        label: "trike".to_owned(),
                    },
                );
            }
        }
    }

    fn on_connector_changed(
        &self,
        kind: ConnectorKind,
        passenger: &str,
        line: Option<(Point, Point)>,
    ) {
        let mut state = self.read();
        if let Some((from, to)) = line {
            state.grow_bounds(from);
            state.grow_bounds(to);
        }
        let lines = match kind {
            ConnectorKind::Enqueue => &mut state.enqueue_lines,
            ConnectorKind::Destination => &mut state.destination_lines,
        };
        match line {
            Some(line) => {
                lines.insert(passenger.to_owned(), line);
            }
            None => {
                lines.remove(passenger);
            }
        }
    }

    fn on_log_event(&self, frame: Frame, id: &str, kind: &str, detail: &str) {
        self.read().push_log(LogLine {
            frame,
            entity: id.to_owned(),
            kind: kind.to_owned(),
            detail: detail.to_owned(),
        });
    }
}
