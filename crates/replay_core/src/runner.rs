//! Replay lifecycle: resource setup, bundle loading, the per-tick driver,
//! and full reset.
//!
//! The driver owns the pause gate. A paused clock yields no tick, so the
//! schedule never runs on a partial frame and resuming picks up exactly
//! where the replay left off.

use std::collections::HashSet;

use bevy_ecs::prelude::{Entity, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentTick, SimulationClock};
use crate::ecs::{PathCursor, TrikeAgent};
use crate::ingest::SimulationBundle;
use crate::sink::{ConnectorLedger, SinkResource};
use crate::store::EntityStore;
use crate::systems::animate::animate_trikes_system;
use crate::systems::check_events::check_events_system;

/// The per-tick schedule: movement first, then event dispatch, so an event
/// scheduled for the frame a segment completes on sees the trike already at
/// the segment's end.
pub fn replay_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((animate_trikes_system, check_events_system).chain());
    schedule
}

/// Insert any replay resource the world is still missing. Existing resources
/// (a sink installed by the caller, say) are left alone.
pub fn init_replay_resources(world: &mut World) {
    if world.get_resource::<SimulationClock>().is_none() {
        world.insert_resource(SimulationClock::default());
    }
    if world.get_resource::<EntityStore>().is_none() {
        world.insert_resource(EntityStore::new());
    }
    if world.get_resource::<ConnectorLedger>().is_none() {
        world.insert_resource(ConnectorLedger::default());
    }
    if world.get_resource::<SinkResource>().is_none() {
        world.insert_resource(SinkResource::null());
    }
}

/// Load a parsed bundle into the world: spawn and position trike entities,
/// seed the store, and announce the static scenery (terminals) plus the
/// initial partition snapshot to the sink.
pub fn load_replay(world: &mut World, bundle: SimulationBundle) {
    init_replay_resources(world);

    let mut seen: HashSet<String> = world
        .resource::<EntityStore>()
        .trikes()
        .iter()
        .map(|(id, _)| id.clone())
        .collect();
    let mut spawned: Vec<(String, Entity)> = Vec::new();
    for spec in bundle.trikes {
        if !seen.insert(spec.id.clone()) {
            eprintln!(
                "WARNING: trike '{}' already initialized, ignoring duplicate",
                spec.id
            );
            continue;
        }
        let mut cursor = PathCursor::new(spec.path);
        if !cursor.position_once() {
            eprintln!(
                "WARNING: trike '{}' has no valid path points and will not be animated",
                spec.id
            );
        }
        let id = spec.id.clone();
        let entity = world
            .spawn((
                TrikeAgent {
                    id: spec.id,
                    speed: spec.speed,
                    create_time: spec.create_time,
                    events: spec.events,
                },
                cursor,
            ))
            .id();
        spawned.push((id, entity));
    }

    {
        let mut store = world.resource_mut::<EntityStore>();
        for (id, entity) in &spawned {
            store.register_trike(id, *entity);
        }
        store.load_passengers(bundle.passengers);
        store.set_terminals(bundle.terminals);
        store.set_metadata(bundle.metadata);
    }

    let store = world.resource::<EntityStore>();
    let snapshot = store.partition_snapshot();
    let terminals = store.terminals().to_vec();
    let sink = world.resource::<SinkResource>();
    for terminal in &terminals {
        sink.0
            .on_entity_appear(&terminal.id, terminal.location, "terminal");
    }
    sink.0.on_status_changed(&snapshot);
}

/// Run one tick: advance the clock, publish the tick, run the schedule.
/// Returns `false` when the clock is paused and nothing ran.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> bool {
    let tick = match world.resource_mut::<SimulationClock>().tick() {
        Some(tick) => tick,
        None => return false,
    };
    world.insert_resource(CurrentTick(tick));
    schedule.run(world);
    true
}

/// Run up to `count` ticks; returns how many actually ran.
pub fn run_ticks(world: &mut World, schedule: &mut Schedule, count: usize) -> usize {
    (0..count)
        .filter(|_| run_tick(world, schedule))
        .count()
}

/// Tear the replay down to a blank slate: despawn trike entities, clear the
/// store and connector ledger, rewind the clock. Safe to call repeatedly.
pub fn reset_replay(world: &mut World) {
    let entities: Vec<Entity> = world
        .get_resource::<EntityStore>()
        .map(|store| store.trikes().iter().map(|(_, entity)| *entity).collect())
        .unwrap_or_default();
    for entity in entities {
        world.despawn(entity);
    }
    if let Some(mut store) = world.get_resource_mut::<EntityStore>() {
        store.reset();
    }
    if let Some(mut ledger) = world.get_resource_mut::<ConnectorLedger>() {
        ledger.clear();
    }
    if let Some(mut clock) = world.get_resource_mut::<SimulationClock>() {
        clock.reset();
    }
    world.remove_resource::<CurrentTick>();
}
