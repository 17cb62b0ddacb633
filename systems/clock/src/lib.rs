#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation clock driving the world and every pure system.
//!
//! [`Simulation`] owns the authoritative world together with the fire
//! lifecycle, controller and movement systems. Each frame it submits a
//! [`Command::Tick`] and pumps the resulting events through the systems in
//! a fixed order until no further commands are produced. User actions such
//! as [`Simulation::start`] or [`Simulation::select_map`] go through the same
//! pump, so every observer sees one consistent event stream.

mod clutter;
mod config;
mod log_sink;

use std::{fmt, time::Duration};

use firebot_core::{
    Command, ControllerState, Event, FloorPlan, FrameSnapshot, GeometryProvider, LogLevel,
    LogSink, MapId, OperatingMode, Rect,
};
use firebot_system_controller::Controller;
use firebot_system_fire_lifecycle::FireLifecycle;
use firebot_system_movement::Movement;
use firebot_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

pub use clutter::{scatter_clutter, MAX_CLUTTER};
pub use config::{
    BatterySection, FireSection, GridSection, MotionSection, SimulationConfig, TimingSection,
    MIN_CELL_SIZE,
};
pub use log_sink::TracingLogSink;

const MAX_PUMP_ROUNDS: usize = 32;

/// Failures reported by user actions and configuration loading.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The geometry provider does not know the requested map.
    #[error("unknown map `{0}`")]
    UnknownMap(MapId),
    /// The geometry provider knows the map but cannot describe all of it.
    #[error("map `{0}` is missing bounds or obstacles")]
    MissingGeometry(MapId),
    /// The geometry provider returned non-finite or empty geometry.
    #[error("map `{0}` has invalid geometry")]
    InvalidGeometry(MapId),
    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] toml::de::Error),
    /// A configuration value lies outside its accepted range.
    #[error("configuration value `{field}` is out of range: {value}")]
    OutOfRange {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// Events produced while processing a single frame or user action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Every event the world emitted, in emission order.
    pub events: Vec<Event>,
}

impl TickReport {
    /// Narrative log lines contained in the report.
    pub fn log_lines(&self) -> impl Iterator<Item = (LogLevel, &str)> {
        self.events.iter().filter_map(|event| match event {
            Event::Logged { level, message } => Some((*level, message.as_str())),
            _ => None,
        })
    }
}

/// Tick-driven simulation loop.
pub struct Simulation {
    world: World,
    lifecycle: FireLifecycle,
    controller: Controller,
    movement: Movement,
    geometry: Box<dyn GeometryProvider>,
    log_sink: Box<dyn LogSink>,
    config: SimulationConfig,
    clutter_rng: ChaCha8Rng,
    map: Option<MapId>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("lifecycle", &self.lifecycle)
            .field("controller", &self.controller)
            .field("movement", &self.movement)
            .field("config", &self.config)
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a stopped simulation with no floor plan loaded.
    ///
    /// Narrative log lines go to [`TracingLogSink`] until another sink is
    /// installed with [`Simulation::with_log_sink`].
    #[must_use]
    pub fn new(config: SimulationConfig, geometry: Box<dyn GeometryProvider>) -> Self {
        let sampler = config.sampler();
        let mut simulation = Self {
            world: World::with_config(config.world_config()),
            lifecycle: FireLifecycle::new(config.lifecycle_config(), sampler),
            controller: Controller::new(config.controller_config(), sampler, config.pathfinder()),
            movement: Movement::new(config.movement_config()),
            geometry,
            log_sink: Box::new(TracingLogSink),
            clutter_rng: ChaCha8Rng::seed_from_u64(config.clutter_seed()),
            map: None,
            config,
        };

        let _ = simulation.submit(vec![
            Command::SetMode {
                mode: simulation.config.mode,
            },
            Command::SetSpeed {
                speed: simulation.config.motion.speed,
            },
            Command::ConfigureBattery {
                model: simulation.config.battery_model(),
            },
        ]);
        simulation
    }

    /// Replaces the narrative log sink.
    #[must_use]
    pub fn with_log_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    /// Configuration the simulation was built from.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Read-only access to the authoritative world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Map currently loaded, if any.
    #[must_use]
    pub fn map(&self) -> Option<&MapId> {
        self.map.as_ref()
    }

    /// Maps offered by the geometry provider.
    #[must_use]
    pub fn available_maps(&self) -> Vec<MapId> {
        self.geometry.map_ids()
    }

    /// Snapshot handed to rendering surfaces.
    #[must_use]
    pub fn frame(&self) -> FrameSnapshot {
        query::frame(&self.world)
    }

    /// Loads a map from the geometry provider, stopping any active run and
    /// re-placing the robot at a random free point.
    ///
    /// On failure the error is logged and the previous map stays loaded.
    pub fn select_map(&mut self, map: &MapId) -> Result<TickReport, SimulationError> {
        let (bounds, obstacles) = match self.fetch_geometry(map) {
            Ok(geometry) => geometry,
            Err(error) => {
                self.log_sink.log(LogLevel::Error, &error.to_string());
                return Err(error);
            }
        };

        let mut obstacles = obstacles;
        let interior = bounds.expanded(-self.config.motion.interior_margin);
        let clutter = scatter_clutter(
            interior,
            &obstacles,
            self.config.obstacle_density,
            self.config.motion.obstacle_padding,
            &mut self.clutter_rng,
        );
        debug!(map = %map, clutter = clutter.len(), "loading floor plan");
        obstacles.extend(clutter);

        let mut report = self.submit(vec![Command::LoadFloorPlan {
            plan: FloorPlan {
                id: map.clone(),
                bounds,
                obstacles,
            },
        }]);
        self.map = Some(map.clone());
        report.events.extend(self.replace_robot().events);
        Ok(report)
    }

    /// Starts a run. A no-op while already running.
    pub fn start(&mut self) -> TickReport {
        self.submit(vec![Command::Start])
    }

    /// Stops the active run, invalidating pending callbacks, and re-places
    /// the robot. A no-op when nothing is running.
    pub fn stop(&mut self) -> TickReport {
        let was_active = query::is_running(&self.world)
            || query::state(&self.world) != ControllerState::Idle;
        let mut report = self.submit(vec![Command::Stop]);
        if was_active {
            report.events.extend(self.replace_robot().events);
        }
        report
    }

    /// Switches the operating mode, stopping any active run first.
    pub fn set_mode(&mut self, mode: OperatingMode) -> TickReport {
        self.config.mode = mode;
        self.submit(vec![Command::SetMode { mode }])
    }

    /// Updates the distance travelled per tick.
    pub fn set_speed(&mut self, speed: f32) -> TickReport {
        if !speed.is_finite() || speed <= 0.0 {
            debug!(speed, "ignoring invalid speed");
            return TickReport::default();
        }
        self.config.motion.speed = speed;
        self.submit(vec![Command::SetSpeed { speed }])
    }

    /// Updates the confidence a detection must reach to produce a fire.
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.lifecycle.set_confidence_threshold(threshold);
        self.config.fires.confidence_threshold = self.lifecycle.confidence_threshold();
    }

    /// Updates the clutter density and reloads the current map with it.
    pub fn set_obstacle_density(&mut self, density: f32) -> Result<TickReport, SimulationError> {
        if density.is_finite() {
            self.config.obstacle_density = density.clamp(0.0, 1.0);
        }
        match self.map.clone() {
            Some(map) => self.select_map(&map),
            None => Ok(TickReport::default()),
        }
    }

    /// Refills the battery and releases the low-battery state.
    pub fn recharge(&mut self) -> TickReport {
        self.submit(vec![Command::Recharge])
    }

    /// Advances the simulation by one frame. Does nothing while stopped.
    pub fn advance(&mut self) -> TickReport {
        self.advance_by(self.config.frame_duration())
    }

    /// Advances the simulation by `dt`. Does nothing while stopped.
    pub fn advance_by(&mut self, dt: Duration) -> TickReport {
        if !query::is_running(&self.world) {
            return TickReport::default();
        }
        self.submit(vec![Command::Tick { dt }])
    }

    /// Applies an arbitrary command and pumps its consequences through the
    /// systems.
    pub fn apply(&mut self, command: Command) -> TickReport {
        self.submit(vec![command])
    }

    fn fetch_geometry(&self, map: &MapId) -> Result<(Rect, Vec<Rect>), SimulationError> {
        match (self.geometry.bounds(map), self.geometry.obstacles(map)) {
            (Some(bounds), Some(obstacles)) => {
                let usable = bounds.is_finite()
                    && bounds.width() > 0.0
                    && bounds.height() > 0.0
                    && obstacles.iter().all(Rect::is_finite);
                if usable {
                    Ok((bounds, obstacles))
                } else {
                    Err(SimulationError::InvalidGeometry(map.clone()))
                }
            }
            (None, None) => Err(SimulationError::UnknownMap(map.clone())),
            _ => Err(SimulationError::MissingGeometry(map.clone())),
        }
    }

    fn replace_robot(&mut self) -> TickReport {
        let view = query::simulation_view(&self.world);
        match self.controller.free_point(&view) {
            Some(position) => self.submit(vec![Command::PlaceRobot { position }]),
            None => TickReport::default(),
        }
    }

    fn submit(&mut self, commands: Vec<Command>) -> TickReport {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.pump(events)
    }

    fn pump(&mut self, mut events: Vec<Event>) -> TickReport {
        let mut report = TickReport::default();

        for _ in 0..MAX_PUMP_ROUNDS {
            if events.is_empty() {
                return report;
            }
            self.forward_logs(&events);

            let mut next = Vec::new();
            let mut commands = Vec::new();

            self.lifecycle.handle(
                &events,
                &query::simulation_view(&self.world),
                &mut commands,
            );
            self.apply_all(&mut commands, &mut next);

            self.controller.handle(
                &events,
                &query::simulation_view(&self.world),
                &mut commands,
            );
            self.apply_all(&mut commands, &mut next);

            self.movement.handle(
                &events,
                &query::simulation_view(&self.world),
                &mut commands,
            );
            self.apply_all(&mut commands, &mut next);

            report.events.append(&mut events);
            events = next;
        }

        if !events.is_empty() {
            warn!(
                pending = events.len(),
                "event pump did not settle; dropping remaining events"
            );
        }
        report
    }

    fn apply_all(&mut self, commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, out_events);
        }
    }

    fn forward_logs(&mut self, events: &[Event]) {
        for event in events {
            if let Event::Logged { level, message } = event {
                self.log_sink.log(*level, message);
            }
        }
    }
}
