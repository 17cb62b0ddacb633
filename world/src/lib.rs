#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation context for Firebot.
//!
//! The world owns the robot position, the single fire slot, the controller
//! state, the obstacle field and the deferred timer queue. Nothing outside
//! this crate mutates them; systems request changes through [`Command`]
//! values and observe the outcome as [`Event`] values.

mod scheduler;

use std::time::Duration;

use firebot_core::{
    Arrival, BatteryModel, Command, ControllerState, Event, Fire, FireClearReason, FireId,
    LogLevel, MapId, MotionPhase, ObstacleField, OperatingMode, Path, Position, Timer,
    WELCOME_BANNER,
};
use tracing::debug;

use self::scheduler::{PendingTimer, Scheduler};

const FULL_CHARGE: f32 = 100.0;
const DEFAULT_ROBOT_POSITION: Position = Position::new(50.0, 50.0);

/// Tunables applied while ingesting floor plans and moving the robot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Margin added around every obstacle at ingestion time.
    pub obstacle_padding: f32,
    /// Margin separating the navigable interior from the map bounds.
    pub interior_margin: f32,
    /// Initial distance travelled per tick.
    pub speed: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            obstacle_padding: 20.0,
            interior_margin: 30.0,
            speed: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Battery {
    model: BatteryModel,
    level: f32,
}

/// Represents the authoritative Firebot simulation state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: WorldConfig,
    map: Option<MapId>,
    field: Option<ObstacleField>,
    mode: OperatingMode,
    running: bool,
    epoch: u64,
    state: ControllerState,
    visit: u64,
    robot: Position,
    patrol_target: Option<Position>,
    path: Option<Path>,
    fire: Option<Fire>,
    next_fire_id: u32,
    speed: f32,
    battery: Option<Battery>,
    scheduler: Scheduler,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world with default tunables and no floor plan.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world using the provided tunables.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            config,
            map: None,
            field: None,
            mode: OperatingMode::Fire,
            running: false,
            epoch: 0,
            state: ControllerState::Idle,
            visit: 0,
            robot: DEFAULT_ROBOT_POSITION,
            patrol_target: None,
            path: None,
            fire: None,
            next_fire_id: 0,
            speed: config.speed,
            battery: None,
            scheduler: Scheduler::default(),
            tick_index: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn enter_state(&mut self, state: ControllerState, out_events: &mut Vec<Event>) {
        let previous = self.state;
        self.state = state;
        self.visit = self.visit.wrapping_add(1);

        if previous.phase() == MotionPhase::Approach && state.phase() != MotionPhase::Approach {
            self.path = None;
        }
        if state.phase() == MotionPhase::Approach {
            self.patrol_target = None;
        }

        out_events.push(Event::StateEntered { state, previous });
    }

    fn halt(&mut self, out_events: &mut Vec<Event>) {
        if self.running {
            self.running = false;
            self.epoch = self.epoch.saturating_add(1);
            out_events.push(Event::SimulationStopped);
            out_events.push(Event::Logged {
                level: LogLevel::Error,
                message: "Simulation stopped.".to_owned(),
            });
        }

        if let Some(fire) = self.fire.take() {
            out_events.push(Event::FireCleared {
                fire: fire.id,
                reason: FireClearReason::Reset,
            });
        }
        self.path = None;
        self.patrol_target = None;

        if self.state != ControllerState::Idle {
            self.enter_state(ControllerState::Idle, out_events);
        }
    }

    fn start(&mut self, out_events: &mut Vec<Event>) {
        if self.running {
            return;
        }

        if self.field.is_none() {
            out_events.push(Event::StartRejected);
            out_events.push(Event::Logged {
                level: LogLevel::Error,
                message: "Cannot start: no floor plan loaded.".to_owned(),
            });
            return;
        }

        self.running = true;
        self.epoch = self.epoch.saturating_add(1);
        self.path = None;
        self.patrol_target = None;
        out_events.push(Event::SimulationStarted { mode: self.mode });
        out_events.push(Event::Logged {
            level: LogLevel::System,
            message: format!("Simulation started ({} mode).", self.mode),
        });
        self.enter_state(ControllerState::Idle, out_events);
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        if self.running {
            self.drain_battery(out_events);
        }

        for pending in self.scheduler.drain_due(self.elapsed) {
            if self.timer_is_current(&pending) {
                out_events.push(Event::TimerElapsed {
                    timer: pending.timer,
                });
            } else {
                debug!(
                    timer = ?pending.timer,
                    epoch = pending.epoch,
                    visit = pending.visit,
                    "discarding stale timer"
                );
            }
        }
    }

    fn drain_battery(&mut self, out_events: &mut Vec<Event>) {
        if self.state == ControllerState::LowBattery {
            return;
        }

        let Some(battery) = self.battery.as_mut() else {
            return;
        };

        battery.level = (battery.level - battery.model.drain_per_tick).max(0.0);
        if battery.level > battery.model.low_threshold {
            return;
        }

        let level = battery.level;
        self.patrol_target = None;
        out_events.push(Event::BatteryDepleted { level });
        out_events.push(Event::Logged {
            level: LogLevel::Warning,
            message: format!("Battery low ({level:.0}%). Standing by for recharge."),
        });
        self.enter_state(ControllerState::LowBattery, out_events);
        self.path = None;
    }

    fn timer_is_current(&self, pending: &PendingTimer) -> bool {
        if !self.running || pending.epoch != self.epoch {
            return false;
        }

        match pending.timer {
            Timer::Dwell { state } => self.state == state && pending.visit == self.visit,
            Timer::FireTimeout { fire } => self.fire_id() == Some(fire),
        }
    }

    fn fire_id(&self) -> Option<FireId> {
        self.fire.map(|fire| fire.id)
    }

    fn transition(
        &mut self,
        from: ControllerState,
        to: ControllerState,
        out_events: &mut Vec<Event>,
    ) {
        if !self.running || self.state != from {
            debug!(%from, %to, current = %self.state, "ignoring outdated transition");
            return;
        }

        self.enter_state(to, out_events);
        out_events.push(Event::Logged {
            level: LogLevel::System,
            message: format!("[STATE] {from} → {to}"),
        });

        if to == ControllerState::Complete {
            self.running = false;
            self.epoch = self.epoch.saturating_add(1);
            out_events.push(Event::SimulationStopped);
        }
    }

    fn move_robot(&mut self, to: Position, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }

        if let Some(field) = &self.field {
            if field.is_blocked(to) && !field.is_blocked(self.robot) {
                debug!(x = to.x(), y = to.y(), "rejecting move into blocked space");
                return;
            }
        }

        let from = self.robot;
        self.robot = to;
        out_events.push(Event::RobotMoved { from, to });
    }

    fn report_arrival(&mut self, arrival: Arrival, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }

        match arrival {
            Arrival::PatrolPoint => {
                self.patrol_target = None;
                out_events.push(Event::Arrived { arrival });
            }
            Arrival::Fire { fire } => {
                if self.fire_id() != Some(fire) || self.state.phase() != MotionPhase::Approach {
                    debug!(fire = fire.get(), "ignoring arrival at an inactive fire");
                    return;
                }
                self.path = None;
                out_events.push(Event::Arrived { arrival });
            }
        }
    }

    fn spawn_fire(&mut self, position: Position, confidence: f32, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }

        if let Some(existing) = self.fire {
            debug!(fire = existing.id.get(), "fire slot occupied; spawn rejected");
            return;
        }

        let fire = Fire {
            id: FireId::new(self.next_fire_id),
            position,
            ignited_at: self.elapsed,
            confidence,
        };
        self.next_fire_id = self.next_fire_id.wrapping_add(1);
        self.fire = Some(fire);
        out_events.push(Event::FireSpawned { fire });
    }

    fn expire_fire(&mut self, fire: FireId, out_events: &mut Vec<Event>) {
        if !self.running || self.fire_id() != Some(fire) {
            debug!(fire = fire.get(), "ignoring expiry for a fire that already left");
            return;
        }

        self.fire = None;
        out_events.push(Event::FireCleared {
            fire,
            reason: FireClearReason::TimedOut,
        });
    }

    fn recharge(&mut self, out_events: &mut Vec<Event>) {
        let Some(battery) = self.battery.as_mut() else {
            return;
        };

        battery.level = FULL_CHARGE;
        out_events.push(Event::Recharged);
        out_events.push(Event::Logged {
            level: LogLevel::System,
            message: "Battery recharged.".to_owned(),
        });

        if self.state == ControllerState::LowBattery {
            self.enter_state(ControllerState::Idle, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadFloorPlan { plan } => {
            world.halt(out_events);
            let obstacles = plan.obstacles.len();
            world.field = Some(ObstacleField::new(
                plan.bounds,
                &plan.obstacles,
                world.config.obstacle_padding,
                world.config.interior_margin,
            ));
            out_events.push(Event::Logged {
                level: LogLevel::System,
                message: format!("Map loaded: {}", plan.id.as_str().to_uppercase()),
            });
            out_events.push(Event::FloorPlanLoaded {
                map: plan.id.clone(),
                obstacles,
            });
            world.map = Some(plan.id);
        }
        Command::ConfigureBattery { model } => {
            world.battery = model.map(|model| Battery {
                model,
                level: FULL_CHARGE,
            });
        }
        Command::SetSpeed { speed } => {
            if speed.is_finite() && speed > 0.0 {
                world.speed = speed;
            } else {
                debug!(speed, "ignoring invalid speed");
            }
        }
        Command::SetMode { mode } => {
            if world.mode == mode {
                return;
            }
            world.halt(out_events);
            world.mode = mode;
            out_events.push(Event::ModeChanged { mode });
            out_events.push(Event::Logged {
                level: LogLevel::System,
                message: format!("Mode set to {mode}."),
            });
        }
        Command::Start => world.start(out_events),
        Command::Stop => world.halt(out_events),
        Command::Recharge => world.recharge(out_events),
        Command::Tick { dt } => world.advance_clock(dt, out_events),
        Command::PlaceRobot { position } => {
            world.robot = position;
            out_events.push(Event::RobotPlaced { position });
        }
        Command::MoveRobot { to } => world.move_robot(to, out_events),
        Command::SetPatrolTarget { target } => {
            if world.running || target.is_none() {
                world.patrol_target = target;
            }
        }
        Command::AssignPath { path } => {
            if let Some(assigned) = &path {
                out_events.push(Event::PathAssigned {
                    waypoints: assigned.len(),
                });
            }
            world.path = path;
        }
        Command::ConsumeWaypoint => {
            if let Some(path) = world.path.as_mut() {
                let _ = path.advance();
            }
        }
        Command::ReportArrival { arrival } => world.report_arrival(arrival, out_events),
        Command::TransitionState { from, to } => world.transition(from, to, out_events),
        Command::ScheduleTimer { delay, timer } => {
            if world.running {
                let due = world.elapsed.saturating_add(delay);
                world.scheduler.schedule(due, world.epoch, world.visit, timer);
            } else {
                debug!(?timer, "ignoring timer scheduled while stopped");
            }
        }
        Command::SpawnFire {
            position,
            confidence,
        } => world.spawn_fire(position, confidence, out_events),
        Command::ExpireFire { fire } => world.expire_fire(fire, out_events),
        Command::ExtinguishFire => {
            if let Some(fire) = world.fire.take() {
                out_events.push(Event::FireCleared {
                    fire: fire.id,
                    reason: FireClearReason::Extinguished,
                });
            }
        }
        Command::Announce { level, message } => {
            out_events.push(Event::Logged { level, message });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use firebot_core::{
        ControllerState, Fire, FrameSnapshot, MapId, ObstacleField, OperatingMode, Position,
        SimulationView,
    };

    /// Retrieves the welcome banner that adapters may display to users.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures the read-only snapshot handed to systems.
    #[must_use]
    pub fn simulation_view(world: &World) -> SimulationView<'_> {
        SimulationView {
            running: world.running,
            mode: world.mode,
            state: world.state,
            tick: world.tick_index,
            elapsed: world.elapsed,
            robot: world.robot,
            patrol_target: world.patrol_target,
            path: world.path.as_ref(),
            fire: world.fire,
            speed: world.speed,
            battery: world.battery.map(|battery| battery.level),
            field: world.field.as_ref(),
        }
    }

    /// Captures the per-tick snapshot consumed by rendering surfaces.
    #[must_use]
    pub fn frame(world: &World) -> FrameSnapshot {
        let elapsed_ms = u64::try_from(world.elapsed.as_millis()).unwrap_or(u64::MAX);
        FrameSnapshot {
            tick: world.tick_index,
            elapsed_ms,
            robot: world.robot,
            fire: world.fire.map(|fire| fire.position),
            fire_visible: world.fire.is_some(),
            state: world.state,
            mode: world.mode,
            battery: world.battery.map(|battery| battery.level),
            waypoints: world
                .path
                .as_ref()
                .map(|path| path.iter().copied().collect())
                .unwrap_or_default(),
        }
    }

    /// Identifier of the loaded floor plan.
    #[must_use]
    pub fn map(world: &World) -> Option<&MapId> {
        world.map.as_ref()
    }

    /// Obstacle field of the loaded floor plan.
    #[must_use]
    pub fn obstacle_field(world: &World) -> Option<&ObstacleField> {
        world.field.as_ref()
    }

    /// Whether the simulation is running.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.running
    }

    /// Active operating mode.
    #[must_use]
    pub fn mode(world: &World) -> OperatingMode {
        world.mode
    }

    /// Active controller state.
    #[must_use]
    pub fn state(world: &World) -> ControllerState {
        world.state
    }

    /// Robot position.
    #[must_use]
    pub fn robot(world: &World) -> Position {
        world.robot
    }

    /// Occupant of the fire slot.
    #[must_use]
    pub fn fire(world: &World) -> Option<Fire> {
        world.fire
    }

    /// Battery charge when the battery model is enabled.
    #[must_use]
    pub fn battery(world: &World) -> Option<f32> {
        world.battery.map(|battery| battery.level)
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of timers still queued, stale or not.
    #[must_use]
    pub fn pending_timers(world: &World) -> usize {
        world.scheduler.len()
    }
}
