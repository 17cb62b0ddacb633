#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Robot controller system driving the firefighting state machine.
//!
//! The controller never mutates state directly. It answers world events with
//! guarded [`Command::TransitionState`] requests and dwell timers, so a
//! transition computed from an outdated view is rejected by the world.

mod mission;

use std::time::Duration;

use firebot_core::{
    Command, ControllerState, Event, FireClearReason, LogLevel, OperatingMode, Position,
    SimulationView, Timer,
};
use firebot_system_fire_lifecycle::FreePointSampler;
use firebot_system_pathfinding::GridPathfinder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use self::mission::{FullMission, Mission, PatrolCycle};

/// Dwell durations for every timed state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// `IDLE` dwell before scanning in the full mission.
    pub full_idle_dwell: Duration,
    /// Nozzle alignment time.
    pub aim_dwell: Duration,
    /// Spray time in the full mission.
    pub extinguish_dwell: Duration,
    /// Residual fire re-scan time.
    pub verify_dwell: Duration,
    /// `IDLE` dwell before patrolling in the collapsed cycle.
    pub collapsed_idle_dwell: Duration,
    /// Delay between detection and approach in the collapsed cycle.
    pub detected_dwell: Duration,
    /// Spray time in the collapsed cycle.
    pub extinguishing_dwell: Duration,
    /// Seed of the patrol target random stream.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            full_idle_dwell: Duration::from_millis(2000),
            aim_dwell: Duration::from_millis(1800),
            extinguish_dwell: Duration::from_millis(2500),
            verify_dwell: Duration::from_millis(2000),
            collapsed_idle_dwell: Duration::from_millis(500),
            detected_dwell: Duration::from_millis(1000),
            extinguishing_dwell: Duration::from_millis(2000),
            rng_seed: 0,
        }
    }
}

/// Pure system that sequences controller states for the active mode.
#[derive(Debug)]
pub struct Controller {
    kit: Toolkit,
    mission: Option<Box<dyn Mission>>,
}

impl Controller {
    /// Creates the controller using the supplied configuration and helpers.
    #[must_use]
    pub fn new(config: Config, sampler: FreePointSampler, pathfinder: GridPathfinder) -> Self {
        Self {
            kit: Toolkit {
                config,
                rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
                sampler,
                pathfinder,
                approach_started: None,
            },
            mission: None,
        }
    }

    /// Draws a collision-free point from the controller's random stream.
    ///
    /// Used to re-place the robot when a map is loaded or a run is stopped.
    pub fn free_point(&mut self, view: &SimulationView<'_>) -> Option<Position> {
        let field = view.field?;
        Some(self.kit.sampler.sample(&mut self.kit.rng, field))
    }

    /// Consumes world events and the simulation view to emit controller
    /// commands.
    pub fn handle(&mut self, events: &[Event], view: &SimulationView<'_>, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SimulationStarted { mode } => {
                    self.mission = Some(select_mission(*mode));
                    self.kit.approach_started = None;
                }
                _ => self.dispatch(event, view, out),
            }
        }
    }

    fn dispatch(&mut self, event: &Event, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        let Some(mission) = self.mission.as_deref() else {
            return;
        };
        let kit = &mut self.kit;

        match event {
            Event::StateEntered { state, .. } => {
                if view.running || *state == ControllerState::Complete {
                    mission.on_enter(*state, kit, view, out);
                }
            }
            Event::TimerElapsed {
                timer: Timer::Dwell { state },
            } => mission.on_timer(*state, kit, view, out),
            Event::TimeAdvanced { .. } => {
                if view.running {
                    mission.on_tick(kit, view, out);
                }
            }
            Event::Arrived { arrival } => mission.on_arrive(*arrival, kit, view, out),
            Event::FireSpawned { .. } => mission.on_fire_spawned(kit, view, out),
            Event::FireCleared {
                reason: FireClearReason::TimedOut,
                ..
            } => mission.on_fire_timed_out(kit, view, out),
            _ => {}
        }
    }
}

fn select_mission(mode: OperatingMode) -> Box<dyn Mission> {
    if mode.runs_full_mission() {
        Box::new(FullMission)
    } else {
        Box::new(PatrolCycle {
            plan_routes: mode.plans_routes(),
        })
    }
}

/// Shared helpers handed to every mission callback.
#[derive(Debug)]
pub(crate) struct Toolkit {
    config: Config,
    rng: ChaCha8Rng,
    sampler: FreePointSampler,
    pathfinder: GridPathfinder,
    approach_started: Option<Duration>,
}

impl Toolkit {
    fn transition(from: ControllerState, to: ControllerState, out: &mut Vec<Command>) {
        out.push(Command::TransitionState { from, to });
    }

    fn dwell(delay: Duration, state: ControllerState, out: &mut Vec<Command>) {
        out.push(Command::ScheduleTimer {
            delay,
            timer: Timer::Dwell { state },
        });
    }

    fn announce(level: LogLevel, message: impl Into<String>, out: &mut Vec<Command>) {
        out.push(Command::Announce {
            level,
            message: message.into(),
        });
    }

    /// Keeps a patrol target available while roaming.
    fn ensure_patrol_target(&mut self, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        if view.patrol_target.is_some() {
            return;
        }
        let Some(field) = view.field else {
            return;
        };

        let target = self.sampler.sample(&mut self.rng, field);
        out.push(Command::SetPatrolTarget {
            target: Some(target),
        });
    }

    /// Starts an approach toward the active fire. Returns `false` when the
    /// fire is already gone.
    fn begin_approach(
        &mut self,
        plan_route: bool,
        view: &SimulationView<'_>,
        out: &mut Vec<Command>,
    ) -> bool {
        let Some(fire) = view.fire else {
            return false;
        };
        self.approach_started = Some(view.elapsed);

        if !plan_route {
            out.push(Command::AssignPath { path: None });
            Self::announce(LogLevel::Info, "[NAV] Heading straight for the fire", out);
            return true;
        }

        let Some(field) = view.field else {
            out.push(Command::AssignPath { path: None });
            return true;
        };

        let path = self.pathfinder.find_path(view.robot, fire.position, field);
        if path.is_empty()
            && self
                .pathfinder
                .is_within_one_cell(view.robot, fire.position, field.bounds())
        {
            Self::announce(
                LogLevel::Info,
                "[NAV] Fire is within reach - moving directly toward it",
                out,
            );
        } else if path.is_empty() {
            debug!("no route to fire; falling back to direct movement");
            Self::announce(
                LogLevel::Warning,
                "[NAV] No route found - moving directly toward the fire",
                out,
            );
        } else {
            Self::announce(
                LogLevel::Info,
                format!(
                    "[NAV] Path planned - navigating to fire source ({} waypoints)",
                    path.len()
                ),
                out,
            );
        }
        out.push(Command::AssignPath { path: Some(path) });
        true
    }

    /// Reports the travel time of the approach that just finished.
    fn report_travel_time(&mut self, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        let Some(started) = self.approach_started.take() else {
            return;
        };
        let seconds = view.elapsed.saturating_sub(started).as_secs_f32();
        Self::announce(
            LogLevel::Path,
            format!("[NAV] Target reached in {seconds:.1} s"),
            out,
        );
    }
}
