use std::ops::Range;

use firebot_core::{ObstacleField, Position, Rect};
use firebot_system_pathfinding::{GridPathfinder, OccupancyGrid};
use proptest::prelude::*;

fn field_with(obstacles: &[Rect]) -> ObstacleField {
    ObstacleField::new(Rect::new(0.0, 0.0, 800.0, 600.0), obstacles, 20.0, 30.0)
}

fn assert_route_is_clear(field: &ObstacleField, waypoints: &[Position]) {
    for waypoint in waypoints {
        assert!(
            !field.is_blocked(*waypoint),
            "waypoint {waypoint:?} lies in blocked space"
        );
    }
    for pair in waypoints.windows(2) {
        let step = pair[0].distance_to(pair[1]);
        assert!((step - 20.0).abs() < 1e-3, "waypoints are not adjacent cells");
    }
}

#[test]
fn route_detours_around_separating_wall() {
    let field = field_with(&[Rect::new(380.0, 0.0, 40.0, 400.0)]);
    let start = Position::new(150.0, 150.0);
    let goal = Position::new(650.0, 150.0);

    let path = GridPathfinder::default().find_path(start, goal, &field);
    let waypoints: Vec<Position> = path.iter().copied().collect();

    assert!(!waypoints.is_empty());
    assert_route_is_clear(&field, &waypoints);
    assert!(
        waypoints.iter().any(|waypoint| waypoint.y() > 420.0),
        "route must pass below the padded wall"
    );

    let last = waypoints.last().copied().expect("route has waypoints");
    assert!(last.distance_to(goal) <= 20.0 * 2.0_f32.sqrt() + 1e-3);
}

#[test]
fn fully_separated_goal_has_no_route() {
    let field = field_with(&[Rect::new(380.0, 0.0, 40.0, 600.0)]);

    let path = GridPathfinder::default().find_path(
        Position::new(150.0, 300.0),
        Position::new(650.0, 300.0),
        &field,
    );

    assert!(path.is_empty());
}

#[test]
fn blocked_start_snaps_to_nearest_free_cell() {
    let field = field_with(&[
        Rect::new(20.0, 20.0, 200.0, 80.0),
        Rect::new(300.0, 250.0, 200.0, 100.0),
    ]);
    let start = Position::new(50.0, 50.0);
    assert!(field.is_blocked(start));

    let path = GridPathfinder::default().find_path(start, Position::new(600.0, 400.0), &field);
    let waypoints: Vec<Position> = path.iter().copied().collect();

    assert!(!waypoints.is_empty());
    assert!(!field.is_blocked(waypoints[0]));
    assert_route_is_clear(&field, &waypoints);
}

#[test]
fn grid_marks_padded_obstacles() {
    let field = field_with(&[Rect::new(300.0, 250.0, 200.0, 100.0)]);
    let grid = OccupancyGrid::build(&field, 20.0);

    let inside = grid.cell_of(Position::new(290.0, 240.0)).expect("on grid");
    let outside = grid.cell_of(Position::new(270.0, 240.0)).expect("on grid");

    assert!(grid.is_blocked(inside));
    assert!(!grid.is_blocked(outside));
}

fn obstacle_strategy() -> impl Strategy<Value = Rect> {
    (0.0f32..700.0, 0.0f32..500.0, 10.0f32..150.0, 10.0f32..150.0)
        .prop_map(|(x, y, width, height)| Rect::new(x, y, width, height))
}

fn position_in(x: Range<f32>, y: Range<f32>) -> impl Strategy<Value = Position> {
    (x, y).prop_map(|(x, y)| Position::new(x, y))
}

proptest! {
    #[test]
    fn wall_with_a_gap_is_always_bypassed(
        start in position_in(50.0..330.0, 50.0..550.0),
        goal in position_in(470.0..750.0, 50.0..550.0)
    ) {
        let field = field_with(&[Rect::new(380.0, 0.0, 40.0, 400.0)]);

        let path = GridPathfinder::default().find_path(start, goal, &field);
        let waypoints: Vec<Position> = path.iter().copied().collect();

        prop_assert!(!waypoints.is_empty());
        assert_route_is_clear(&field, &waypoints);
        prop_assert!(waypoints.iter().any(|waypoint| waypoint.y() > 420.0));

        let last = waypoints.last().copied().expect("route has waypoints");
        prop_assert!(last.distance_to(goal) <= 30.0 * 2.0_f32.sqrt() + 1e-3);
    }

    #[test]
    fn routes_never_touch_padded_obstacles(
        obstacles in prop::collection::vec(obstacle_strategy(), 0..6),
        start in position_in(0.0..800.0, 0.0..600.0),
        goal in position_in(0.0..800.0, 0.0..600.0)
    ) {
        let field = field_with(&obstacles);

        let path = GridPathfinder::default().find_path(start, goal, &field);
        let waypoints: Vec<Position> = path.iter().copied().collect();

        assert_route_is_clear(&field, &waypoints);
    }
}
