//! Frame-scoped event dispatch.
//!
//! Runs after the animator each tick. Passenger appearances due at or
//! before the current frame are announced first (the initial population
//! appears at frame 0, before any frame is processed), then every trike's
//! event list is scanned in store registration order. The scan stops at the
//! first event scheduled beyond the current frame and at any MOVE or WAIT
//! the animator has not finished consuming, so a trike's events always
//! dispatch in list order.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentTick, Frame};
use crate::ecs::{PathCursor, TrikeAgent};
use crate::events::EventKind;
use crate::sink::{ConnectorLedger, PresentationSink, SinkResource};
use crate::store::EntityStore;
use crate::systems::{appear, dropoff, enqueue, load};

pub fn check_events_system(
    tick: Res<CurrentTick>,
    mut store: ResMut<EntityStore>,
    mut ledger: ResMut<ConnectorLedger>,
    sink: Res<SinkResource>,
    mut trikes: Query<(&TrikeAgent, &mut PathCursor)>,
) {
    let frame = tick.0.frame;
    let sink = sink.0.as_ref();
    let revision_before = store.revision();

    announce_new_passengers(frame, &mut store, sink);

    let order = store.trikes().to_vec();
    for (_, entity) in order {
        let Ok((agent, mut cursor)) = trikes.get_mut(entity) else {
            continue;
        };
        scan_trike(frame, agent, &mut cursor, &mut store, &mut ledger, sink);
    }

    // One snapshot per tick, and only when partitions actually moved.
    if store.revision() != revision_before {
        sink.on_status_changed(&store.partition_snapshot());
    }
}

fn announce_new_passengers(frame: Frame, store: &mut EntityStore, sink: &dyn PresentationSink) {
    for id in store.drain_appearances_through(frame) {
        let Some(passenger) = store.passenger(&id) else {
            continue;
        };
        let at = passenger
            .events
            .iter()
            .find_map(|event| match event.kind {
                EventKind::Appear { location } => Some(location),
                _ => None,
            })
            .unwrap_or(passenger.src);
        sink.on_entity_appear(&id, at, "passenger");
        sink.on_log_event(frame, &id, "APPEAR", "waiting for pickup");
    }
}

fn scan_trike(
    frame: Frame,
    agent: &TrikeAgent,
    cursor: &mut PathCursor,
    store: &mut EntityStore,
    ledger: &mut ConnectorLedger,
    sink: &dyn PresentationSink,
) {
    loop {
        let Some(event) = agent.events.get(cursor.event_index).cloned() else {
            break;
        };
        if event.time > frame {
            break;
        }
        // The animator consumes these through its countdowns; an unfinished
        // one holds the scan so later events stay in sequence.
        if matches!(
            event.kind,
            EventKind::Move { .. } | EventKind::Wait { .. }
        ) {
            break;
        }
        // An event that missed its frame (it was gated, or the consumer fell
        // behind) fires now rather than being dropped: dispatch is
        // at-or-after the scheduled frame, exactly once, in list order.
        if event.time < frame {
            eprintln!(
                "WARNING: trike '{}': {} event missed frame {}, dispatching at {}",
                agent.id,
                event.kind.label(),
                event.time,
                frame
            );
        }
        dispatch(frame, agent, cursor, &event.kind, store, ledger, sink);
        cursor.event_index += 1;
    }
}

fn dispatch(
    frame: Frame,
    agent: &TrikeAgent,
    cursor: &PathCursor,
    kind: &EventKind,
    store: &mut EntityStore,
    ledger: &mut ConnectorLedger,
    sink: &dyn PresentationSink,
) {
    match kind {
        EventKind::Appear { location } => {
            sink.on_log_event(frame, &agent.id, "APPEAR", "entered the map");
            appear::on_trike_appear(&agent.id, *location, sink);
        }
        EventKind::Load { passenger } => {
            sink.on_log_event(frame, &agent.id, "LOAD", passenger);
            load::on_load(&agent.id, passenger, store, ledger, sink);
        }
        EventKind::DropOff { passenger } => {
            sink.on_log_event(frame, &agent.id, "DROP-OFF", passenger);
            dropoff::on_drop_off(&agent.id, passenger, store, ledger, sink);
        }
        EventKind::Enqueue { passenger } => {
            sink.on_log_event(frame, &agent.id, "ENQUEUE", passenger);
            enqueue::on_enqueue(&agent.id, cursor.position, passenger, store, ledger, sink);
        }
        // Held at the scan, never dispatched.
        EventKind::Move { .. } | EventKind::Wait { .. } => {}
    }
}
