//! Per-frame movement for tricycles.
//!
//! Each tick advances a trike through every frame elapsed since its last
//! processed one, so a resumed or slow consumer catches up without skipping
//! frames. Movement is linear interpolation along the polyline path; an
//! active WAIT consumes frames without movement, and a due MOVE arms a
//! segment countdown that the scanner in `check_events` waits on.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentTick, SimulationClock, Tick};
use crate::ecs::{AnimPhase, PathCursor, TrikeAgent};
use crate::events::EventKind;
use crate::sink::{PresentationSink, SinkResource};
use crate::store::EntityStore;

pub fn animate_trikes_system(
    tick: Res<CurrentTick>,
    clock: Res<SimulationClock>,
    mut store: ResMut<EntityStore>,
    sink: Res<SinkResource>,
    mut trikes: Query<(&TrikeAgent, &mut PathCursor)>,
) {
    let tick = tick.0;
    let multiplier = clock.speed_multiplier();
    // Store registration order, not ECS iteration order.
    let order = store.trikes().to_vec();
    for (_, entity) in order {
        let Ok((agent, mut cursor)) = trikes.get_mut(entity) else {
            continue;
        };
        animate_trike(
            agent,
            &mut cursor,
            tick,
            multiplier,
            &mut store,
            sink.0.as_ref(),
        );
    }
}

fn animate_trike(
    agent: &TrikeAgent,
    cursor: &mut PathCursor,
    tick: Tick,
    multiplier: f64,
    store: &mut EntityStore,
    sink: &dyn PresentationSink,
) {
    if cursor.phase == AnimPhase::Uninitialized || tick.frame < agent.create_time {
        cursor.last_processed_frame = tick.frame;
        return;
    }
    if cursor.phase == AnimPhase::Positioned {
        cursor.phase = AnimPhase::Animating;
    }

    let start_position = cursor.position;
    while cursor.last_processed_frame < tick.frame {
        let frame = cursor.last_processed_frame + 1;
        step_frame(agent, cursor, frame, tick.elapsed_ms, multiplier);
        cursor.last_processed_frame = frame;
        store.advance_frame_watermark(frame);
    }

    if cursor.position != start_position {
        if let Some(at) = cursor.position {
            sink.on_trike_moved(&agent.id, at);
        }
    }
}

/// Advance one trike through a single frame.
fn step_frame(
    agent: &TrikeAgent,
    cursor: &mut PathCursor,
    frame: u64,
    elapsed_ms: u64,
    multiplier: f64,
) {
    if let Some(event) = agent.events.get(cursor.event_index) {
        if event.time <= frame {
            match event.kind {
                EventKind::Wait { duration_ms } => {
                    let remaining = cursor.wait_remaining_ms.get_or_insert(duration_ms as f64);
                    *remaining -= elapsed_ms as f64 * multiplier;
                    if *remaining <= 0.0 {
                        cursor.wait_remaining_ms = None;
                        cursor.event_index += 1;
                    }
                    // Waiting halts movement for this frame.
                    return;
                }
                EventKind::Move { steps } => {
                    if cursor.phase == AnimPhase::Finished {
                        // No segments left to traverse; drop the countdown so
                        // the scanner is not gated forever.
                        cursor.move_steps_left = None;
                        cursor.event_index += 1;
                    } else if cursor.move_steps_left.is_none() {
                        cursor.move_steps_left = Some(steps.max(1));
                    }
                }
                _ => {}
            }
        }
    }

    if cursor.phase == AnimPhase::Finished || cursor.at_path_end() {
        cursor.phase = AnimPhase::Finished;
        return;
    }

    let from = cursor.path[cursor.path_index];
    let to = cursor.path[cursor.path_index + 1];
    let segment_len = from.distance(to);
    if segment_len <= f64::EPSILON {
        complete_segment(cursor);
        return;
    }

    cursor.segment_travelled += agent.speed * elapsed_ms as f64 * multiplier;
    let progress = (cursor.segment_travelled / segment_len).min(1.0);
    cursor.position = Some(from.lerp(to, progress));
    if progress >= 1.0 {
        complete_segment(cursor);
    }
}

fn complete_segment(cursor: &mut PathCursor) {
    cursor.path_index += 1;
    cursor.segment_travelled = 0.0;
    cursor.position = Some(cursor.path[cursor.path_index]);
    if let Some(steps) = cursor.move_steps_left.as_mut() {
        *steps = steps.saturating_sub(1);
        if *steps == 0 {
            cursor.move_steps_left = None;
            cursor.event_index += 1;
        }
    }
    if cursor.at_path_end() {
        cursor.phase = AnimPhase::Finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::Tick;
    use crate::events::SimEvent;
    use crate::geo::Point;
    use crate::sink::ConnectorLedger;

    fn unit_segment_trike(speed: f64, events: Vec<SimEvent>) -> (TrikeAgent, PathCursor) {
        let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0)];
        let mut cursor = PathCursor::new(path);
        assert!(cursor.position_once());
        let agent = TrikeAgent {
            id: "trike_1".to_owned(),
            speed,
            create_time: 0,
            events,
        };
        (agent, cursor)
    }

    fn world_with(agent: TrikeAgent, cursor: PathCursor) -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(ConnectorLedger::default());
        world.insert_resource(SinkResource::null());
        let entity = world.spawn((agent, cursor)).id();
        let mut store = EntityStore::new();
        store.register_trike("trike_1", entity);
        world.insert_resource(store);
        world
    }

    fn tick(world: &mut World, schedule: &mut Schedule, frame: u64) {
        world.insert_resource(CurrentTick(Tick {
            frame,
            elapsed_ms: 25,
        }));
        schedule.run(world);
    }

    #[test]
    fn segment_completes_after_covering_its_length() {
        // 0.01 units per ms over a unit segment: 100 ms, i.e. four 25 ms ticks.
        let (agent, cursor) = unit_segment_trike(0.01, vec![]);
        let mut world = world_with(agent, cursor);
        let mut schedule = Schedule::default();
        schedule.add_systems(animate_trikes_system);

        for frame in 1..=3 {
            tick(&mut world, &mut schedule, frame);
            let mut cursors = world.query::<&PathCursor>();
            assert_eq!(cursors.single(&world).path_index, 0);
        }
        tick(&mut world, &mut schedule, 4);
        let mut cursors = world.query::<&PathCursor>();
        let cursor = cursors.single(&world);
        assert_eq!(cursor.path_index, 1);
        assert_eq!(cursor.phase, AnimPhase::Finished);
        assert_eq!(cursor.position, Some(Point::new(0.0, 1.0)));
    }

    #[test]
    fn active_wait_halts_movement_until_consumed() {
        // 50 ms WAIT at frame 1: two frames stand still, then travel resumes.
        let events = vec![SimEvent {
            time: 1,
            kind: EventKind::Wait { duration_ms: 50 },
        }];
        let (agent, cursor) = unit_segment_trike(0.01, events);
        let mut world = world_with(agent, cursor);
        let mut schedule = Schedule::default();
        schedule.add_systems(animate_trikes_system);

        tick(&mut world, &mut schedule, 1);
        tick(&mut world, &mut schedule, 2);
        {
            let mut cursors = world.query::<&PathCursor>();
            let cursor = cursors.single(&world);
            assert_eq!(cursor.segment_travelled, 0.0);
            assert!(cursor.wait_remaining_ms.is_none());
            assert_eq!(cursor.event_index, 1);
        }
        tick(&mut world, &mut schedule, 3);
        let mut cursors = world.query::<&PathCursor>();
        assert!(cursors.single(&world).segment_travelled > 0.0);
    }

    #[test]
    fn trike_stays_put_before_its_create_time() {
        let (mut agent, cursor) = unit_segment_trike(0.01, vec![]);
        agent.create_time = 10;
        let mut world = world_with(agent, cursor);
        let mut schedule = Schedule::default();
        schedule.add_systems(animate_trikes_system);

        for frame in 1..=5 {
            tick(&mut world, &mut schedule, frame);
        }
        let mut cursors = world.query::<&PathCursor>();
        let cursor = cursors.single(&world);
        assert_eq!(cursor.position, Some(Point::new(0.0, 0.0)));
        assert_eq!(cursor.last_processed_frame, 5);
    }

    #[test]
    fn empty_path_is_never_animated() {
        let mut cursor = PathCursor::new(vec![]);
        assert!(!cursor.position_once());
        let agent = TrikeAgent {
            id: "trike_1".to_owned(),
            speed: 0.01,
            create_time: 0,
            events: vec![],
        };
        let mut world = world_with(agent, cursor);
        let mut schedule = Schedule::default();
        schedule.add_systems(animate_trikes_system);

        tick(&mut world, &mut schedule, 1);
        let mut cursors = world.query::<&PathCursor>();
        let cursor = cursors.single(&world);
        assert_eq!(cursor.phase, AnimPhase::Uninitialized);
        assert_eq!(cursor.position, None);
    }

    #[test]
    fn catches_up_over_skipped_frames() {
        let (agent, cursor) = unit_segment_trike(0.01, vec![]);
        let mut world = world_with(agent, cursor);
        let mut schedule = Schedule::default();
        schedule.add_systems(animate_trikes_system);

        // A single tick at frame 4 processes frames 1 through 4 in order.
        tick(&mut world, &mut schedule, 4);
        let mut cursors = world.query::<&PathCursor>();
        let cursor = cursors.single(&world);
        assert_eq!(cursor.path_index, 1);
        assert_eq!(cursor.last_processed_frame, 4);
        assert_eq!(world.resource::<EntityStore>().frame_watermark(), 4);
    }
}
