//! Shared fixtures for unit and integration tests. Compiled only with the
//! `test-helpers` feature.

use std::sync::{Arc, Mutex};

use crate::clock::Frame;
use crate::geo::Point;
use crate::sink::{ConnectorKind, PresentationSink};
use crate::store::{Passenger, PartitionSnapshot};

/// One recorded sink callback, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Appear {
        id: String,
        at: Point,
        label: String,
    },
    StatusChanged(PartitionSnapshot),
    TrikeMoved {
        id: String,
        at: Point,
    },
    Connector {
        kind: ConnectorKind,
        passenger: String,
        line: Option<(Point, Point)>,
    },
    Log {
        frame: Frame,
        id: String,
        kind: String,
        detail: String,
    },
}

/// A sink that records every callback. Clones share the same call list, so a
/// test can keep a handle after boxing one into a [`SinkResource`].
///
/// [`SinkResource`]: crate::sink::SinkResource
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().expect("sink lock").clone()
    }

    fn push(&self, call: SinkCall) {
        self.calls.lock().expect("sink lock").push(call);
    }
}

impl PresentationSink for RecordingSink {
    fn on_entity_appear(&self, id: &str, at: Point, label: &str) {
        self.push(SinkCall::Appear {
            id: id.to_owned(),
            at,
            label: label.to_owned(),
        });
    }

    fn on_status_changed(&self, snapshot: &PartitionSnapshot) {
        self.push(SinkCall::StatusChanged(snapshot.clone()));
    }

    fn on_trike_moved(&self, id: &str, at: Point) {
        self.push(SinkCall::TrikeMoved {
            id: id.to_owned(),
            at,
        });
    }

    fn on_connector_changed(
        &self,
        kind: ConnectorKind,
        passenger: &str,
        line: Option<(Point, Point)>,
    ) {
        self.push(SinkCall::Connector {
            kind,
            passenger: passenger.to_owned(),
            line,
        });
    }

    fn on_log_event(&self, frame: Frame, id: &str, kind: &str, detail: &str) {
        self.push(SinkCall::Log {
            frame,
            id: id.to_owned(),
            kind: kind.to_owned(),
            detail: detail.to_owned(),
        });
    }
}

/// A passenger created at `create_time` with placeholder coordinates and no
/// expiry, ready to be loaded into an [`EntityStore`].
///
/// [`EntityStore`]: crate::store::EntityStore
pub fn waiting_passenger(id: &str, create_time: Frame) -> Passenger {
    Passenger {
        id: id.to_owned(),
        src: Point::new(0.0, 0.0),
        dest: Point::new(1.0, 1.0),
        create_time,
        death_time: None,
        events: Vec::new(),
    }
}
