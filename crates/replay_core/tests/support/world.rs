#![allow(dead_code)]

use bevy_ecs::prelude::{Schedule, World};
use replay_core::clock::SimulationClock;
use replay_core::ecs::PathCursor;
use replay_core::ingest::parse_bundle;
use replay_core::runner::{load_replay, replay_schedule, run_tick};
use replay_core::sink::SinkResource;
use replay_core::store::EntityStore;
use replay_core::test_helpers::RecordingSink;
use serde_json::Value;

/// A loaded replay plus a handle on its recording sink.
pub struct TestReplay {
    pub world: World,
    pub schedule: Schedule,
    pub sink: RecordingSink,
}

impl TestReplay {
    pub fn from_doc(doc: &Value) -> Self {
        let bundle = parse_bundle(doc).expect("bundle parses");
        let sink = RecordingSink::default();
        let mut world = World::new();
        world.insert_resource(SinkResource(Box::new(sink.clone())));
        load_replay(&mut world, bundle);
        Self {
            world,
            schedule: replay_schedule(),
            sink,
        }
    }

    /// Returns `false` when the clock was paused and nothing ran.
    pub fn tick(&mut self) -> bool {
        run_tick(&mut self.world, &mut self.schedule)
    }

    pub fn run_frames(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }

    pub fn store(&self) -> &EntityStore {
        self.world.resource::<EntityStore>()
    }

    pub fn clock_mut(&mut self) -> bevy_ecs::world::Mut<'_, SimulationClock> {
        self.world.resource_mut::<SimulationClock>()
    }

    pub fn cursor(&self, trike_id: &str) -> PathCursor {
        let entity = self
            .store()
            .trike_entity(trike_id)
            .expect("trike registered");
        self.world
            .get::<PathCursor>(entity)
            .expect("cursor component")
            .clone()
    }

    /// Every loaded passenger sits in exactly one partition, and every
    /// registered trike in exactly one of its three.
    pub fn assert_partitions_cover(&self) {
        let store = self.store();
        let snapshot = store.partition_snapshot();
        let mut passenger_ids: Vec<&String> = snapshot
            .waiting
            .iter()
            .chain(&snapshot.enqueued)
            .chain(&snapshot.onboard)
            .chain(&snapshot.completed)
            .collect();
        passenger_ids.sort();
        let total = passenger_ids.len();
        passenger_ids.dedup();
        assert_eq!(total, passenger_ids.len(), "passenger in two partitions");
        assert_eq!(total, store.passenger_count(), "unpartitioned passenger");

        let mut trike_ids: Vec<&String> = snapshot
            .trikes_default
            .iter()
            .chain(&snapshot.trikes_enqueueing)
            .chain(&snapshot.trikes_serving)
            .collect();
        trike_ids.sort();
        let total = trike_ids.len();
        trike_ids.dedup();
        assert_eq!(total, trike_ids.len(), "trike in two partitions");
        assert_eq!(total, store.trikes().len(), "unpartitioned trike");
    }
}
