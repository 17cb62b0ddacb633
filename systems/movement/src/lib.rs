#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Continuous collision model and the per-tick movement system.
//!
//! [`step_toward`] advances a point by a fixed distance, sliding along a
//! single axis when the full step would enter blocked space. The [`Movement`]
//! system applies it to the robot on every clock tick and reports arrivals
//! back to the world.

use firebot_core::{
    Arrival, Command, Event, MotionPhase, ObstacleField, Position, SimulationView,
};

/// Distance at which a patrol target or route waypoint counts as reached.
pub const DEFAULT_WAYPOINT_ARRIVAL: f32 = 5.0;

/// Stand-off distance from which the robot sprays a fire.
pub const DEFAULT_FIRE_STANDOFF: f32 = 60.0;

/// Axis the robot slid along after the full step was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Only the horizontal component was applied.
    X,
    /// Only the vertical component was applied.
    Y,
}

/// Result of a single movement step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The point is already within the arrival radius of the target.
    Arrived,
    /// The point moved.
    Moved {
        /// Position after the step.
        position: Position,
        /// Axis used when the step had to slide.
        slide: Option<Axis>,
    },
    /// Neither the full step nor either slide is free.
    Blocked,
}

/// Advances `from` toward `to` by at most `speed`.
///
/// The full step is tried first, then the X-only and Y-only components. A
/// point that already lies in blocked space moves freely so it can leave it.
#[must_use]
pub fn step_toward(
    from: Position,
    to: Position,
    speed: f32,
    arrival_radius: f32,
    field: &ObstacleField,
) -> StepOutcome {
    let distance = from.distance_to(to);
    if distance <= arrival_radius {
        return StepOutcome::Arrived;
    }
    if distance <= f32::EPSILON || speed <= 0.0 {
        return StepOutcome::Blocked;
    }

    let travel = speed.min(distance);
    let next_x = from.x() + (to.x() - from.x()) / distance * travel;
    let next_y = from.y() + (to.y() - from.y()) / distance * travel;
    let full = Position::new(next_x, next_y);

    if field.is_blocked(from) || !field.is_blocked(full) {
        return StepOutcome::Moved {
            position: full,
            slide: None,
        };
    }

    let slide_x = from.with_x(next_x);
    if next_x != from.x() && !field.is_blocked(slide_x) {
        return StepOutcome::Moved {
            position: slide_x,
            slide: Some(Axis::X),
        };
    }

    let slide_y = from.with_y(next_y);
    if next_y != from.y() && !field.is_blocked(slide_y) {
        return StepOutcome::Moved {
            position: slide_y,
            slide: Some(Axis::Y),
        };
    }

    StepOutcome::Blocked
}

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    waypoint_arrival: f32,
    fire_standoff: f32,
}

impl Config {
    /// Creates a configuration from the waypoint and fire arrival distances.
    #[must_use]
    pub const fn new(waypoint_arrival: f32, fire_standoff: f32) -> Self {
        Self {
            waypoint_arrival,
            fire_standoff,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_WAYPOINT_ARRIVAL, DEFAULT_FIRE_STANDOFF)
    }
}

/// Pure system that moves the robot once per clock tick.
#[derive(Debug)]
pub struct Movement {
    config: Config,
}

impl Movement {
    /// Creates a movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes world events and the simulation view to emit movement commands.
    pub fn handle(&mut self, events: &[Event], view: &SimulationView<'_>, out: &mut Vec<Command>) {
        if !view.running {
            return;
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        let Some(field) = view.field else {
            return;
        };

        match view.state.phase() {
            MotionPhase::Hold => {}
            MotionPhase::Roam => self.roam(view, field, out),
            MotionPhase::Approach => self.approach(view, field, out),
        }
    }

    fn roam(&self, view: &SimulationView<'_>, field: &ObstacleField, out: &mut Vec<Command>) {
        let Some(target) = view.patrol_target else {
            return;
        };

        match step_toward(
            view.robot,
            target,
            view.speed,
            self.config.waypoint_arrival,
            field,
        ) {
            StepOutcome::Arrived => out.push(Command::ReportArrival {
                arrival: Arrival::PatrolPoint,
            }),
            StepOutcome::Moved { position, .. } => out.push(Command::MoveRobot { to: position }),
            StepOutcome::Blocked => out.push(Command::SetPatrolTarget { target: None }),
        }
    }

    fn approach(&self, view: &SimulationView<'_>, field: &ObstacleField, out: &mut Vec<Command>) {
        let Some(fire) = view.fire else {
            return;
        };

        if view.robot.distance_to(fire.position) <= self.config.fire_standoff {
            out.push(Command::ReportArrival {
                arrival: Arrival::Fire { fire: fire.id },
            });
            return;
        }

        let mut target = fire.position;
        if let Some(path) = view.path {
            for waypoint in path.iter() {
                if view.robot.distance_to(*waypoint) <= self.config.waypoint_arrival {
                    out.push(Command::ConsumeWaypoint);
                    continue;
                }
                target = *waypoint;
                break;
            }
        }

        if let StepOutcome::Moved { position, .. } =
            step_toward(view.robot, target, view.speed, 0.0, field)
        {
            out.push(Command::MoveRobot { to: position });
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firebot_core::Rect;

    fn field_with(obstacles: &[Rect]) -> ObstacleField {
        ObstacleField::new(Rect::new(0.0, 0.0, 800.0, 600.0), obstacles, 20.0, 30.0)
    }

    #[test]
    fn free_step_covers_full_speed() {
        let field = field_with(&[]);
        let outcome = step_toward(
            Position::new(100.0, 100.0),
            Position::new(200.0, 100.0),
            3.0,
            5.0,
            &field,
        );
        assert_eq!(
            outcome,
            StepOutcome::Moved {
                position: Position::new(103.0, 100.0),
                slide: None,
            }
        );
    }

    #[test]
    fn step_never_overshoots_target() {
        let field = field_with(&[]);
        let outcome = step_toward(
            Position::new(100.0, 100.0),
            Position::new(102.0, 100.0),
            3.0,
            0.0,
            &field,
        );
        assert_eq!(
            outcome,
            StepOutcome::Moved {
                position: Position::new(102.0, 100.0),
                slide: None,
            }
        );
    }

    #[test]
    fn within_radius_reports_arrival() {
        let field = field_with(&[]);
        let outcome = step_toward(
            Position::new(100.0, 100.0),
            Position::new(104.0, 100.0),
            3.0,
            5.0,
            &field,
        );
        assert_eq!(outcome, StepOutcome::Arrived);
    }

    #[test]
    fn diagonal_into_wall_slides_along_x() {
        // Padded obstacle spans y 280..340; the robot sits just above it.
        let field = field_with(&[Rect::new(100.0, 300.0, 400.0, 20.0)]);
        let outcome = step_toward(
            Position::new(200.0, 279.0),
            Position::new(400.0, 479.0),
            3.0,
            5.0,
            &field,
        );

        let StepOutcome::Moved { position, slide } = outcome else {
            panic!("expected a slide, got {outcome:?}");
        };
        assert_eq!(slide, Some(Axis::X));
        assert_eq!(position.y(), 279.0);
        assert!(position.x() > 200.0);
    }

    #[test]
    fn diagonal_into_wall_slides_along_y() {
        // Padded obstacle spans x 280..340; the robot sits just left of it.
        let field = field_with(&[Rect::new(300.0, 100.0, 20.0, 400.0)]);
        let outcome = step_toward(
            Position::new(279.0, 200.0),
            Position::new(479.0, 400.0),
            3.0,
            5.0,
            &field,
        );

        let StepOutcome::Moved { position, slide } = outcome else {
            panic!("expected a slide, got {outcome:?}");
        };
        assert_eq!(slide, Some(Axis::Y));
        assert_eq!(position.x(), 279.0);
        assert!(position.y() > 200.0);
    }

    #[test]
    fn head_on_into_wall_is_blocked() {
        let field = field_with(&[Rect::new(300.0, 100.0, 20.0, 400.0)]);
        let outcome = step_toward(
            Position::new(279.0, 200.0),
            Position::new(479.0, 200.0),
            3.0,
            5.0,
            &field,
        );
        assert_eq!(outcome, StepOutcome::Blocked);
    }

    #[test]
    fn robot_inside_padding_may_escape() {
        let field = field_with(&[Rect::new(20.0, 20.0, 200.0, 80.0)]);
        let start = Position::new(50.0, 50.0);
        assert!(field.is_blocked(start));

        let outcome = step_toward(start, Position::new(50.0, 300.0), 3.0, 5.0, &field);
        assert_eq!(
            outcome,
            StepOutcome::Moved {
                position: Position::new(50.0, 53.0),
                slide: None,
            }
        );
    }
}
