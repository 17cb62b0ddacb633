use std::time::Duration;

use firebot_core::{
    Arrival, Command, ControllerState, Event, FloorPlan, MapId, ObstacleField, Path, Position,
    Rect,
};
use firebot_system_movement::{step_toward, Movement, StepOutcome, DEFAULT_WAYPOINT_ARRIVAL};
use firebot_world::{self as world, query, World};
use proptest::prelude::*;

const FRAME: Duration = Duration::from_millis(16);

fn world_with(obstacles: Vec<Rect>) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadFloorPlan {
            plan: FloorPlan {
                id: MapId::new("test"),
                bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
                obstacles,
            },
        },
        &mut events,
    );
    world::apply(&mut world, Command::Start, &mut events);
    world
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn tick(world: &mut World, movement: &mut Movement) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: FRAME }, &mut events);

    let mut commands = Vec::new();
    movement.handle(&events, &query::simulation_view(world), &mut commands);
    let generated = apply_all(world, commands);
    events.extend(generated);
    events
}

#[test]
fn patrol_slides_around_convex_corner_to_reach_target() {
    let mut world = world_with(vec![Rect::new(300.0, 250.0, 200.0, 100.0)]);
    let mut movement = Movement::default();
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceRobot {
                position: Position::new(250.0, 300.0),
            },
            Command::TransitionState {
                from: ControllerState::Idle,
                to: ControllerState::Patrolling,
            },
            Command::SetPatrolTarget {
                target: Some(Position::new(400.0, 200.0)),
            },
        ],
    );

    let field = query::obstacle_field(&world).expect("floor plan loaded").clone();
    let mut arrived = false;
    for _ in 0..500 {
        let events = tick(&mut world, &mut movement);
        assert!(!field.is_blocked(query::robot(&world)));
        if events.contains(&Event::Arrived {
            arrival: Arrival::PatrolPoint,
        }) {
            arrived = true;
            break;
        }
    }

    assert!(arrived, "robot never reached the patrol target");
    assert!(query::robot(&world).distance_to(Position::new(400.0, 200.0)) <= 5.0);
    assert!(query::simulation_view(&world).patrol_target.is_none());
}

#[test]
fn blocked_patrol_discards_target() {
    let mut world = world_with(vec![Rect::new(300.0, 100.0, 20.0, 400.0)]);
    let mut movement = Movement::default();
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceRobot {
                position: Position::new(279.0, 200.0),
            },
            Command::TransitionState {
                from: ControllerState::Idle,
                to: ControllerState::Patrolling,
            },
            Command::SetPatrolTarget {
                target: Some(Position::new(479.0, 200.0)),
            },
        ],
    );

    let _ = tick(&mut world, &mut movement);

    assert_eq!(query::robot(&world), Position::new(279.0, 200.0));
    assert!(query::simulation_view(&world).patrol_target.is_none());
}

#[test]
fn approach_follows_waypoints_then_stops_at_standoff() {
    let mut world = world_with(Vec::new());
    let mut movement = Movement::default();
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceRobot {
                position: Position::new(100.0, 300.0),
            },
            Command::TransitionState {
                from: ControllerState::Idle,
                to: ControllerState::Patrolling,
            },
            Command::SpawnFire {
                position: Position::new(600.0, 300.0),
                confidence: 0.9,
            },
            Command::TransitionState {
                from: ControllerState::Patrolling,
                to: ControllerState::Detected,
            },
            Command::TransitionState {
                from: ControllerState::Detected,
                to: ControllerState::Approaching,
            },
            Command::AssignPath {
                path: Some(Path::new(vec![
                    Position::new(102.0, 300.0),
                    Position::new(200.0, 300.0),
                    Position::new(300.0, 300.0),
                ])),
            },
        ],
    );
    let fire = query::fire(&world).expect("fire spawned").id;

    let _ = tick(&mut world, &mut movement);
    assert_eq!(query::frame(&world).waypoints.len(), 2);

    let mut arrived = false;
    for _ in 0..300 {
        let events = tick(&mut world, &mut movement);
        if events.contains(&Event::Arrived {
            arrival: Arrival::Fire { fire },
        }) {
            arrived = true;
            break;
        }
    }

    assert!(arrived, "robot never reached the fire");
    let distance = query::robot(&world).distance_to(Position::new(600.0, 300.0));
    assert!(distance <= 60.0 && distance > 55.0);
    assert!(query::frame(&world).waypoints.is_empty());
}

#[test]
fn hold_states_do_not_move() {
    let mut world = world_with(Vec::new());
    let mut movement = Movement::default();
    let _ = apply_all(
        &mut world,
        vec![
            Command::PlaceRobot {
                position: Position::new(100.0, 300.0),
            },
            Command::SetPatrolTarget {
                target: Some(Position::new(400.0, 300.0)),
            },
        ],
    );

    let events = tick(&mut world, &mut movement);

    assert_eq!(query::state(&world), ControllerState::Idle);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::RobotMoved { .. })));
}

fn padded_field(obstacles: &[Rect]) -> ObstacleField {
    ObstacleField::new(Rect::new(0.0, 0.0, 800.0, 600.0), obstacles, 20.0, 30.0)
}

fn obstacle_strategy() -> impl Strategy<Value = Rect> {
    (0.0f32..700.0, 0.0f32..500.0, 10.0f32..150.0, 10.0f32..150.0)
        .prop_map(|(x, y, width, height)| Rect::new(x, y, width, height))
}

proptest! {
    #[test]
    fn steps_from_free_space_stay_free_and_close_in(
        obstacles in prop::collection::vec(obstacle_strategy(), 0..6),
        from in (0.0f32..800.0, 0.0f32..600.0),
        to in (0.0f32..800.0, 0.0f32..600.0),
        speed in 0.5f32..10.0
    ) {
        let field = padded_field(&obstacles);
        let from = Position::new(from.0, from.1);
        let to = Position::new(to.0, to.1);
        prop_assume!(!field.is_blocked(from));

        match step_toward(from, to, speed, DEFAULT_WAYPOINT_ARRIVAL, &field) {
            StepOutcome::Arrived => {
                prop_assert!(from.distance_to(to) <= DEFAULT_WAYPOINT_ARRIVAL);
            }
            StepOutcome::Moved { position, .. } => {
                prop_assert!(!field.is_blocked(position));
                prop_assert!(from.distance_to(position) <= speed + 1e-3);
                prop_assert!(position.distance_to(to) <= from.distance_to(to) + 1e-4);
            }
            StepOutcome::Blocked => {}
        }
    }

    #[test]
    fn sliding_rounds_a_corner_to_any_target_beyond_it(
        from in (250.0f32..278.0, 240.0f32..360.0),
        to in (300.0f32..500.0, 60.0f32..200.0)
    ) {
        let field = padded_field(&[Rect::new(300.0, 250.0, 200.0, 100.0)]);
        let target = Position::new(to.0, to.1);
        let mut position = Position::new(from.0, from.1);
        prop_assert!(!field.is_blocked(position));

        let mut arrived = false;
        for _ in 0..2000 {
            match step_toward(position, target, 3.0, DEFAULT_WAYPOINT_ARRIVAL, &field) {
                StepOutcome::Arrived => {
                    arrived = true;
                    break;
                }
                StepOutcome::Moved { position: next, .. } => {
                    prop_assert!(!field.is_blocked(next));
                    position = next;
                }
                StepOutcome::Blocked => {
                    return Err(TestCaseError::fail(format!("stuck at {position:?}")));
                }
            }
        }
        prop_assert!(arrived, "never reached {target:?} from {from:?}");
    }
}
