mod support;

use replay_core::clock::SimulationClock;
use replay_core::ecs::{PassengerStatus, TrikeAgent};
use replay_core::ingest::parse_bundle;
use replay_core::runner::{load_replay, reset_replay};
use support::bundles::single_ride_doc;
use support::world::TestReplay;

#[test]
fn paused_run_converges_to_the_same_state() {
    let mut uninterrupted = TestReplay::from_doc(&single_ride_doc());
    uninterrupted.run_frames(10);

    let mut interrupted = TestReplay::from_doc(&single_ride_doc());
    interrupted.run_frames(3);
    interrupted.clock_mut().pause();
    for _ in 0..6 {
        assert!(!interrupted.tick(), "a paused tick must not run");
    }
    interrupted.clock_mut().resume();
    interrupted.run_frames(7);

    assert_eq!(
        uninterrupted.store().partition_snapshot(),
        interrupted.store().partition_snapshot()
    );
    assert_eq!(
        uninterrupted.store().frame_watermark(),
        interrupted.store().frame_watermark()
    );
    assert_eq!(
        uninterrupted.cursor("trike_1").position,
        interrupted.cursor("trike_1").position
    );
}

#[test]
fn no_frame_advances_while_paused() {
    let mut replay = TestReplay::from_doc(&single_ride_doc());
    replay.run_frames(2);
    let watermark_before = replay.store().frame_watermark();

    replay.clock_mut().pause();
    replay.run_frames(5);

    assert_eq!(replay.world.resource::<SimulationClock>().frame(), 2);
    assert_eq!(replay.store().frame_watermark(), watermark_before);
}

#[test]
fn reset_forgets_the_previous_session() {
    let mut replay = TestReplay::from_doc(&single_ride_doc());
    replay.run_frames(10);
    assert_eq!(
        replay.store().passenger_status("passenger_1"),
        Some(PassengerStatus::Completed)
    );

    reset_replay(&mut replay.world);

    let store = replay.store();
    assert_eq!(store.passenger_count(), 0);
    assert!(store.passenger("passenger_1").is_none());
    assert!(store.trikes().is_empty());
    let snapshot = store.partition_snapshot();
    assert!(snapshot.waiting.is_empty());
    assert!(snapshot.completed.is_empty());
    assert!(snapshot.trikes_default.is_empty());
    assert_eq!(replay.world.resource::<SimulationClock>().frame(), 0);
    let mut agents = replay.world.query::<&TrikeAgent>();
    assert_eq!(agents.iter(&replay.world).count(), 0);
}

#[test]
fn reload_after_reset_replays_identically() {
    let mut replay = TestReplay::from_doc(&single_ride_doc());
    replay.run_frames(10);
    let first_snapshot = replay.store().partition_snapshot();

    reset_replay(&mut replay.world);
    let bundle = parse_bundle(&single_ride_doc()).expect("bundle parses");
    load_replay(&mut replay.world, bundle);
    replay.run_frames(10);

    assert_eq!(replay.store().partition_snapshot(), first_snapshot);
}
