//! Replay events: the closed set of event kinds the router dispatches on,
//! plus tolerant parsing from the bundle wire format.
//!
//! Each trike's event sequence is immutable once parsed and is assumed
//! time-ordered; the router scans it monotonically and dispatches strictly
//! in list order. A structurally invalid or unknown event is dropped with a
//! warning — it never fails the trike it belongs to.

use serde_json::Value;

use crate::clock::Frame;
use crate::geo::Point;

/// The closed union of event kinds. Payloads are validated at parse time so
/// handlers never see a malformed shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Positions a newly visible entity marker at its first known location.
    Appear { location: Point },
    /// Counts path segments the animator traverses; consumed one segment at
    /// a time by the animator, never dispatched by the router.
    Move { steps: u32 },
    /// Halts movement for a wall-clock duration; consumed by the animator.
    Wait { duration_ms: u64 },
    Load { passenger: String },
    DropOff { passenger: String },
    Enqueue { passenger: String },
}

impl EventKind {
    /// Wire/log label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Appear { .. } => "APPEAR",
            EventKind::Move { .. } => "MOVE",
            EventKind::Wait { .. } => "WAIT",
            EventKind::Load { .. } => "LOAD",
            EventKind::DropOff { .. } => "DROP-OFF",
            EventKind::Enqueue { .. } => "ENQUEUE",
        }
    }

    /// Movement bookkeeping never reaches the event log.
    pub fn is_logged(&self) -> bool {
        !matches!(self, EventKind::Move { .. } | EventKind::Wait { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub time: Frame,
    pub kind: EventKind,
}

/// Parse a trike's raw event array, dropping invalid entries with a warning.
pub fn parse_events(owner: &str, raw: &Value) -> Vec<SimEvent> {
    let Some(items) = raw.as_array() else {
        eprintln!("WARNING: {owner}: events field is not an array, ignoring");
        return Vec::new();
    };
    let mut events = Vec::with_capacity(items.len());
    for item in items {
        match parse_event(item) {
            Some(event) => events.push(event),
            None => eprintln!("WARNING: {owner}: dropping malformed event {item}"),
        }
    }
    events
}

fn parse_event(value: &Value) -> Option<SimEvent> {
    let obj = value.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let time = obj.get("time")?.as_u64()?;

    let kind = match kind {
        "APPEAR" => EventKind::Appear {
            location: Point::from_wire(obj.get("location")?)?,
        },
        "MOVE" => {
            let steps = obj.get("data")?.as_u64()?;
            EventKind::Move {
                steps: u32::try_from(steps).ok()?,
            }
        }
        "WAIT" => EventKind::Wait {
            duration_ms: obj.get("data")?.as_u64()?,
        },
        "LOAD" => EventKind::Load {
            passenger: obj.get("data")?.as_str()?.to_owned(),
        },
        "DROP-OFF" => EventKind::DropOff {
            passenger: obj.get("data")?.as_str()?.to_owned(),
        },
        "ENQUEUE" => EventKind::Enqueue {
            passenger: obj.get("data")?.as_str()?.to_owned(),
        },
        // Newer generators emit bookkeeping kinds (NEW_ROAM_PATH, RESET,
        // FINISH, DECIDE) the replay core does not interpret.
        _ => return None,
    };

    Some(SimEvent { time, kind })
}
