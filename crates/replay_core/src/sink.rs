//! Presentation boundary: the sink trait the core notifies, and the
//! connector-line ledger that keeps visual lines consistent with markers.
//!
//! Every handler performs its pure state transition on the store/ledger
//! first and notifies the sink second, so core correctness is testable with
//! no rendering surface attached. Sink calls are fire-and-forget and must be
//! idempotent per call.

use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::Resource;

use crate::clock::Frame;
use crate::geo::Point;
use crate::store::PartitionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    /// Passenger-to-trike line while the trike heads to the pickup.
    Enqueue,
    /// Passenger-to-destination line until drop-off.
    Destination,
}

/// Rendering boundary the core calls into. Default implementations are
/// no-ops so a sink only implements what it displays.
pub trait PresentationSink: Send + Sync {
    fn on_entity_appear(&self, _id: &str, _at: Point, _label: &str) {}

    fn on_status_changed(&self, _snapshot: &PartitionSnapshot) {}

    fn on_trike_moved(&self, _id: &str, _at: Point) {}

    /// `line` is the endpoints of the connector, or `None` when it is removed.
    fn on_connector_changed(
        &self,
        _kind: ConnectorKind,
        _passenger: &str,
        _line: Option<(Point, Point)>,
    ) {
    }

    fn on_log_event(&self, _frame: Frame, _id: &str, _kind: &str, _detail: &str) {}
}

/// Sink that renders nothing; the default until a viewer attaches.
#[derive(Debug, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {}

#[derive(Resource)]
pub struct SinkResource(pub Box<dyn PresentationSink>);

impl SinkResource {
    pub fn null() -> Self {
        Self(Box::new(NullSink))
    }
}

/// Tracks which connector lines exist. Lines are keyed by passenger id and
/// a trike owns at most one enqueue line at a time; linking a second
/// passenger to the same trike displaces the first.
#[derive(Debug, Default, Resource)]
pub struct ConnectorLedger {
    enqueue_by_passenger: HashMap<String, String>,
    enqueue_by_trike: HashMap<String, String>,
    destination: HashSet<String>,
}

impl ConnectorLedger {
    /// Link a passenger's enqueue line to a trike. Re-linking an existing
    /// pair is a no-op. Returns the passenger whose line was displaced when
    /// the trike already owned one.
    pub fn link_enqueue(&mut self, passenger: &str, trike: &str) -> Option<String> {
        if self.enqueue_by_passenger.get(passenger).map(String::as_str) == Some(trike) {
            return None;
        }
        if let Some(previous_trike) = self.enqueue_by_passenger.remove(passenger) {
            self.enqueue_by_trike.remove(&previous_trike);
        }
        let displaced = self
            .enqueue_by_trike
            .insert(trike.to_owned(), passenger.to_owned());
        if let Some(previous) = &displaced {
            self.enqueue_by_passenger.remove(previous);
        }
        self.enqueue_by_passenger
            .insert(passenger.to_owned(), trike.to_owned());
        displaced
    }

    pub fn has_enqueue_line(&self, passenger: &str, trike: &str) -> bool {
        self.enqueue_by_passenger.get(passenger).map(String::as_str) == Some(trike)
    }

    /// Remove a passenger's enqueue line (the pickup happened or the marker
    /// disappeared). Returns the trike that owned it, or `None` if there was
    /// nothing to remove.
    pub fn unlink_enqueue(&mut self, passenger: &str) -> Option<String> {
        let trike = self.enqueue_by_passenger.remove(passenger)?;
        self.enqueue_by_trike.remove(&trike);
        Some(trike)
    }

    /// Returns `false` if the destination line already existed.
    pub fn link_destination(&mut self, passenger: &str) -> bool {
        self.destination.insert(passenger.to_owned())
    }

    /// Returns `false` if there was nothing to remove.
    pub fn unlink_destination(&mut self, passenger: &str) -> bool {
        self.destination.remove(passenger)
    }

    pub fn has_destination_line(&self, passenger: &str) -> bool {
        self.destination.contains(passenger)
    }

    pub fn clear(&mut self) {
        self.enqueue_by_passenger.clear();
        self.enqueue_by_trike.clear();
        self.destination.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trike_owns_at_most_one_enqueue_line() {
        let mut ledger = ConnectorLedger::default();

        assert_eq!(ledger.link_enqueue("p1", "t1"), None);
        assert!(ledger.has_enqueue_line("p1", "t1"));

        // Linking a second passenger displaces the first.
        let displaced = ledger.link_enqueue("p2", "t1");
        assert_eq!(displaced.as_deref(), Some("p1"));
        assert!(!ledger.has_enqueue_line("p1", "t1"));
        assert!(ledger.has_enqueue_line("p2", "t1"));
    }

    #[test]
    fn relinking_the_same_pair_is_idempotent() {
        let mut ledger = ConnectorLedger::default();
        ledger.link_enqueue("p1", "t1");
        assert_eq!(ledger.link_enqueue("p1", "t1"), None);
        assert!(ledger.has_enqueue_line("p1", "t1"));
    }

    #[test]
    fn unlink_returns_the_owner_and_clears_both_sides() {
        let mut ledger = ConnectorLedger::default();
        ledger.link_enqueue("p1", "t1");

        assert_eq!(ledger.unlink_enqueue("p1").as_deref(), Some("t1"));
        assert_eq!(ledger.unlink_enqueue("p1"), None, "nothing left to remove");

        // The trike is free to own a new line.
        assert_eq!(ledger.link_enqueue("p2", "t1"), None);
    }

    #[test]
    fn destination_lines_track_membership() {
        let mut ledger = ConnectorLedger::default();
        assert!(ledger.link_destination("p1"));
        assert!(!ledger.link_destination("p1"));
        assert!(ledger.has_destination_line("p1"));
        assert!(ledger.unlink_destination("p1"));
        assert!(!ledger.unlink_destination("p1"));
    }
}
