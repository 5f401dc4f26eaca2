pub mod animate;
pub mod appear;
pub mod check_events;
pub mod dropoff;
pub mod enqueue;
pub mod load;

#[cfg(test)]
mod end_to_end_tests {
    use bevy_ecs::prelude::World;

    use crate::clock::SimulationClock;
    use crate::ecs::{AnimPhase, PassengerStatus, PathCursor, TrikeStatus};
    use crate::ingest::parse_bundle;
    use crate::runner::{load_replay, replay_schedule, run_tick, run_ticks};
    use crate::sink::SinkResource;
    use crate::store::EntityStore;
    use crate::test_helpers::{RecordingSink, SinkCall};
    use serde_json::json;

    /// One trike, one segment of length 1.0, speed chosen so the segment
    /// completes in exactly four 25 ms ticks, and a LOAD scheduled at
    /// frame 4: the trike must reach path index 1 and the passenger must be
    /// onboard at tick 4, not before.
    #[test]
    fn replays_one_pickup_end_to_end() {
        let doc = json!({
            "trikes": [{
                "id": "trike_1",
                "speed": 0.01,
                "createTime": 0,
                "path": [[0.0, 0.0], [0.0, 1.0]],
                "events": [
                    {"type": "APPEAR", "time": 0, "location": [0.0, 0.0]},
                    {"type": "LOAD", "data": "passenger_1", "time": 4, "location": [0.0, 1.0]},
                ],
            }],
            "passengers": [{
                "id": "passenger_1",
                "src": [0.0, 1.0],
                "dest": [0.0, 2.0],
                "createTime": 0,
                "deathTime": -1,
            }],
        });
        let bundle = parse_bundle(&doc).expect("bundle");

        let sink = RecordingSink::default();
        let mut world = World::new();
        world.insert_resource(SinkResource(Box::new(sink.clone())));
        load_replay(&mut world, bundle);
        let mut schedule = replay_schedule();

        // Frames 1..=3: still travelling, passenger still waiting.
        run_ticks(&mut world, &mut schedule, 3);
        {
            let mut cursors = world.query::<&PathCursor>();
            let cursor = cursors.single(&world);
            assert_eq!(cursor.path_index, 0);
            assert_eq!(cursor.last_processed_frame, 3);
        }
        assert_eq!(
            world.resource::<EntityStore>().passenger_status("passenger_1"),
            Some(PassengerStatus::Waiting)
        );

        // Frame 4: segment completes and the LOAD fires.
        run_tick(&mut world, &mut schedule);
        {
            let mut cursors = world.query::<&PathCursor>();
            let cursor = cursors.single(&world);
            assert_eq!(cursor.path_index, 1);
            assert_eq!(cursor.phase, AnimPhase::Finished);
        }
        let store = world.resource::<EntityStore>();
        assert_eq!(
            store.passenger_status("passenger_1"),
            Some(PassengerStatus::Onboard)
        );
        assert_eq!(store.trike_status("trike_1"), Some(TrikeStatus::Serving));
        assert!(store
            .trike_passengers("trike_1")
            .expect("trike set")
            .contains("passenger_1"));
        assert_eq!(store.frame_watermark(), 4);
        assert!(sink
            .calls()
            .iter()
            .any(|call| matches!(call, SinkCall::TrikeMoved { id, .. } if id == "trike_1")));
    }

    /// Pausing for a stretch of wall-clock ticks and resuming reaches the
    /// same state as never pausing; only wall time differs.
    #[test]
    fn pausing_defers_frames_without_losing_them() {
        let doc = json!({
            "trikes": [{
                "id": "trike_1",
                "speed": 0.01,
                "createTime": 0,
                "path": [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
                "events": [
                    {"type": "LOAD", "data": "passenger_1", "time": 4, "location": [0.0, 1.0]},
                    {"type": "DROP-OFF", "data": "passenger_1", "time": 8, "location": [1.0, 1.0]},
                ],
            }],
            "passengers": [{
                "id": "passenger_1",
                "src": [0.0, 1.0],
                "dest": [1.0, 1.0],
                "createTime": 0,
                "deathTime": -1,
            }],
        });

        let run = |pause_at: Option<u64>, paused_ticks: usize| {
            let bundle = parse_bundle(&doc).expect("bundle");
            let mut world = World::new();
            load_replay(&mut world, bundle);
            let mut schedule = replay_schedule();
            for frame in 1..=10u64 {
                if Some(frame) == pause_at {
                    world.resource_mut::<SimulationClock>().pause();
                    for _ in 0..paused_ticks {
                        assert!(!run_tick(&mut world, &mut schedule));
                    }
                    world.resource_mut::<SimulationClock>().resume();
                }
                assert!(run_tick(&mut world, &mut schedule));
            }
            let store = world.resource::<EntityStore>();
            (
                store.passenger_status("passenger_1"),
                store.trike_status("trike_1"),
                store.frame_watermark(),
            )
        };

        let uninterrupted = run(None, 0);
        let paused = run(Some(5), 7);
        assert_eq!(uninterrupted, paused);
        assert_eq!(uninterrupted.0, Some(PassengerStatus::Completed));
        assert_eq!(uninterrupted.1, Some(TrikeStatus::Default));
    }
}
