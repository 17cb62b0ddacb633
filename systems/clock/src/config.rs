//! File-backed simulation configuration.

use std::{ops::RangeInclusive, time::Duration};

use firebot_core::{BatteryModel, MapId, OperatingMode};
use firebot_system_controller::Config as ControllerConfig;
use firebot_system_fire_lifecycle::{Config as LifecycleConfig, FreePointSampler, FALLBACK_POINT};
use firebot_system_movement::Config as MovementConfig;
use firebot_system_pathfinding::GridPathfinder;
use firebot_world::WorldConfig;
use serde::{Deserialize, Serialize};

use crate::SimulationError;

/// Smallest occupancy grid cell accepted by [`SimulationConfig::validate`].
pub const MIN_CELL_SIZE: f32 = 1.0;

const UNIT: RangeInclusive<f64> = 0.0..=1.0;
const NON_NEGATIVE: RangeInclusive<f64> = 0.0..=f64::MAX;
const POSITIVE: RangeInclusive<f64> = f64::MIN_POSITIVE..=f64::MAX;
const PERCENT: RangeInclusive<f64> = 0.0..=100.0;

/// Every tunable of a simulation run.
///
/// Sections missing from a configuration file keep their defaults, so an
/// empty document describes the stock kitchen simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed from which every random stream is derived.
    pub seed: u64,
    /// Operating mode applied on construction.
    pub mode: OperatingMode,
    /// Map loaded by front ends on startup.
    pub map: MapId,
    /// Simulated milliseconds per frame.
    pub frame_ms: u64,
    /// Share of the eight clutter slots filled on map load, 0.0 to 1.0.
    pub obstacle_density: f32,
    /// Robot kinematics and collision margins.
    pub motion: MotionSection,
    /// Dwell durations and fire lifetimes.
    pub timing: TimingSection,
    /// Ignition and detection tunables.
    pub fires: FireSection,
    /// Occupancy grid tunables.
    pub grid: GridSection,
    /// Optional battery drain model.
    pub battery: BatterySection,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            mode: OperatingMode::Fire,
            map: MapId::new("kitchen"),
            frame_ms: 16,
            obstacle_density: 0.0,
            motion: MotionSection::default(),
            timing: TimingSection::default(),
            fires: FireSection::default(),
            grid: GridSection::default(),
            battery: BatterySection::default(),
        }
    }
}

/// Robot kinematics and collision margins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSection {
    /// Distance travelled per tick.
    pub speed: f32,
    /// Arrival distance for patrol targets and waypoints.
    pub waypoint_arrival: f32,
    /// Spraying distance from a fire.
    pub fire_standoff: f32,
    /// Margin added around every obstacle.
    pub obstacle_padding: f32,
    /// Margin between the map bounds and the navigable interior.
    pub interior_margin: f32,
    /// Attempts made when sampling a free point.
    pub sample_tries: u32,
}

impl Default for MotionSection {
    fn default() -> Self {
        Self {
            speed: 3.0,
            waypoint_arrival: 5.0,
            fire_standoff: 60.0,
            obstacle_padding: 20.0,
            interior_margin: 30.0,
            sample_tries: 500,
        }
    }
}

/// Dwell durations and fire lifetimes in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    /// Full mission `IDLE` dwell.
    pub full_idle_ms: u64,
    /// Full mission detection scan.
    pub scan_ms: u64,
    /// Full mission `AIM` dwell.
    pub aim_ms: u64,
    /// Full mission `EXTINGUISH` dwell.
    pub extinguish_ms: u64,
    /// Full mission `VERIFY` dwell.
    pub verify_ms: u64,
    /// Patrol cycle `IDLE` dwell.
    pub patrol_idle_ms: u64,
    /// Patrol cycle `DETECTED` dwell.
    pub detected_ms: u64,
    /// Patrol cycle `EXTINGUISHING` dwell.
    pub extinguishing_ms: u64,
    /// Fire lifetime in the patrol cycle.
    pub patrol_fire_timeout_ms: u64,
    /// Fire lifetime in the full mission.
    pub full_fire_timeout_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            full_idle_ms: 2000,
            scan_ms: 2500,
            aim_ms: 1800,
            extinguish_ms: 2500,
            verify_ms: 2000,
            patrol_idle_ms: 500,
            detected_ms: 1000,
            extinguishing_ms: 2000,
            patrol_fire_timeout_ms: 5000,
            full_fire_timeout_ms: 20_000,
        }
    }
}

/// Ignition and detection tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireSection {
    /// Per-tick ignition probability while patrolling.
    pub ignition_chance: f64,
    /// Minimum distance between a new fire and the robot.
    pub min_robot_distance: f32,
    /// Extra samples drawn when a candidate is too close to the robot.
    pub resample_attempts: u32,
    /// Lower bound of the synthesized confidence.
    pub confidence_min: f32,
    /// Upper bound of the synthesized confidence.
    pub confidence_max: f32,
    /// Confidence a detection must reach.
    pub confidence_threshold: f32,
}

impl Default for FireSection {
    fn default() -> Self {
        let defaults = LifecycleConfig::default();
        Self {
            ignition_chance: defaults.ignition_chance,
            min_robot_distance: defaults.min_robot_distance,
            resample_attempts: defaults.resample_attempts,
            confidence_min: defaults.confidence_min,
            confidence_max: defaults.confidence_max,
            confidence_threshold: defaults.confidence_threshold,
        }
    }
}

/// Occupancy grid tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    /// Edge length of a grid cell.
    pub cell_size: f32,
    /// Node expansions allowed per search.
    pub expansion_budget: usize,
}

impl Default for GridSection {
    fn default() -> Self {
        let defaults = GridPathfinder::default();
        Self {
            cell_size: defaults.cell_size(),
            expansion_budget: defaults.expansion_budget(),
        }
    }
}

/// Optional battery drain model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatterySection {
    /// Whether the battery drains at all.
    pub enabled: bool,
    /// Charge removed on every running tick.
    pub drain_per_tick: f32,
    /// Charge at or below which the robot stops.
    pub low_threshold: f32,
}

impl Default for BatterySection {
    fn default() -> Self {
        let model = BatteryModel::default();
        Self {
            enabled: false,
            drain_per_tick: model.drain_per_tick,
            low_threshold: model.low_threshold,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document. Missing keys keep their
    /// defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, SimulationError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects probabilities, distances and sizes the systems cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        check("obstacle_density", self.obstacle_density, UNIT)?;
        check("motion.speed", self.motion.speed, POSITIVE)?;
        check("motion.waypoint_arrival", self.motion.waypoint_arrival, NON_NEGATIVE)?;
        check("motion.fire_standoff", self.motion.fire_standoff, NON_NEGATIVE)?;
        check("motion.obstacle_padding", self.motion.obstacle_padding, NON_NEGATIVE)?;
        check("motion.interior_margin", self.motion.interior_margin, NON_NEGATIVE)?;
        check("fires.ignition_chance", self.fires.ignition_chance, UNIT)?;
        check("fires.min_robot_distance", self.fires.min_robot_distance, NON_NEGATIVE)?;
        check("fires.confidence_min", self.fires.confidence_min, UNIT)?;
        check(
            "fires.confidence_max",
            self.fires.confidence_max,
            f64::from(self.fires.confidence_min)..=1.0,
        )?;
        check("fires.confidence_threshold", self.fires.confidence_threshold, UNIT)?;
        check(
            "grid.cell_size",
            self.grid.cell_size,
            f64::from(MIN_CELL_SIZE)..=f64::MAX,
        )?;
        check("battery.drain_per_tick", self.battery.drain_per_tick, NON_NEGATIVE)?;
        check("battery.low_threshold", self.battery.low_threshold, PERCENT)?;
        Ok(())
    }

    /// Duration of a single frame.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }

    /// Parameters of the authoritative world.
    #[must_use]
    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            obstacle_padding: self.motion.obstacle_padding,
            interior_margin: self.motion.interior_margin,
            speed: self.motion.speed,
        }
    }

    /// Battery model handed to the world, if enabled.
    #[must_use]
    pub fn battery_model(&self) -> Option<BatteryModel> {
        self.battery.enabled.then_some(BatteryModel {
            drain_per_tick: self.battery.drain_per_tick,
            low_threshold: self.battery.low_threshold,
        })
    }

    /// Free-point sampler shared by the controller and the fire lifecycle.
    #[must_use]
    pub fn sampler(&self) -> FreePointSampler {
        FreePointSampler::new(self.motion.sample_tries, FALLBACK_POINT)
    }

    /// Grid pathfinder used for approaches.
    #[must_use]
    pub fn pathfinder(&self) -> GridPathfinder {
        GridPathfinder::new(self.grid.cell_size, self.grid.expansion_budget)
    }

    /// Parameters of the movement system.
    #[must_use]
    pub fn movement_config(&self) -> MovementConfig {
        MovementConfig::new(self.motion.waypoint_arrival, self.motion.fire_standoff)
    }

    /// Parameters of the fire lifecycle system.
    #[must_use]
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            ignition_chance: self.fires.ignition_chance,
            min_robot_distance: self.fires.min_robot_distance,
            resample_attempts: self.fires.resample_attempts,
            confidence_min: self.fires.confidence_min,
            confidence_max: self.fires.confidence_max,
            confidence_threshold: self.fires.confidence_threshold,
            collapsed_timeout: millis(self.timing.patrol_fire_timeout_ms),
            full_timeout: millis(self.timing.full_fire_timeout_ms),
            scan_duration: millis(self.timing.scan_ms),
            rng_seed: self.seed,
        }
    }

    /// Parameters of the controller system.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            full_idle_dwell: millis(self.timing.full_idle_ms),
            aim_dwell: millis(self.timing.aim_ms),
            extinguish_dwell: millis(self.timing.extinguish_ms),
            verify_dwell: millis(self.timing.verify_ms),
            collapsed_idle_dwell: millis(self.timing.patrol_idle_ms),
            detected_dwell: millis(self.timing.detected_ms),
            extinguishing_dwell: millis(self.timing.extinguishing_ms),
            rng_seed: self.seed.wrapping_add(1),
        }
    }

    /// Seed of the clutter placement stream.
    #[must_use]
    pub fn clutter_seed(&self) -> u64 {
        self.seed.wrapping_add(2)
    }
}

fn check(
    field: &'static str,
    value: impl Into<f64>,
    accepted: RangeInclusive<f64>,
) -> Result<(), SimulationError> {
    let value = value.into();
    if accepted.contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::OutOfRange { field, value })
    }
}

fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("valid config");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.frame_duration(), Duration::from_millis(16));
        assert!(config.battery_model().is_none());
    }

    #[test]
    fn partial_sections_override_only_named_keys() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 9
            mode = "full"
            map = "office"

            [motion]
            speed = 4.5

            [battery]
            enabled = true
            drain_per_tick = 2.0
            "#,
        )
        .expect("valid config");

        assert_eq!(config.mode, OperatingMode::Full);
        assert_eq!(config.map, MapId::new("office"));
        assert_eq!(config.motion.speed, 4.5);
        assert_eq!(config.motion.fire_standoff, 60.0);
        assert_eq!(
            config.battery_model(),
            Some(BatteryModel {
                drain_per_tick: 2.0,
                low_threshold: 20.0,
            })
        );
        assert_eq!(config.controller_config().rng_seed, 10);
        assert_eq!(config.clutter_seed(), 11);
    }

    #[test]
    fn malformed_document_is_rejected() {
        let error = SimulationConfig::from_toml_str("seed = \"many\"").unwrap_err();
        assert!(matches!(error, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn non_finite_probabilities_are_rejected() {
        let error = SimulationConfig::from_toml_str("[fires]\nignition_chance = nan").unwrap_err();
        assert!(matches!(
            error,
            SimulationError::OutOfRange {
                field: "fires.ignition_chance",
                ..
            }
        ));

        let error =
            SimulationConfig::from_toml_str("[fires]\nconfidence_threshold = inf").unwrap_err();
        assert!(matches!(
            error,
            SimulationError::OutOfRange {
                field: "fires.confidence_threshold",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (document, field) in [
            ("obstacle_density = 1.5", "obstacle_density"),
            ("[motion]\nspeed = 0.0", "motion.speed"),
            ("[motion]\nspeed = -inf", "motion.speed"),
            ("[grid]\ncell_size = 0.001", "grid.cell_size"),
            (
                "[fires]\nconfidence_min = 0.9\nconfidence_max = 0.8",
                "fires.confidence_max",
            ),
            ("[battery]\nlow_threshold = 150.0", "battery.low_threshold"),
        ] {
            match SimulationConfig::from_toml_str(document) {
                Err(SimulationError::OutOfRange { field: rejected, .. }) => {
                    assert_eq!(rejected, field, "{document}");
                }
                other => panic!("expected `{field}` to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn timing_section_feeds_system_configs() {
        let mut config = SimulationConfig::default();
        config.timing.aim_ms = 900;
        config.timing.full_fire_timeout_ms = 12_000;

        assert_eq!(
            config.controller_config().aim_dwell,
            Duration::from_millis(900)
        );
        assert_eq!(
            config.lifecycle_config().full_timeout,
            Duration::from_secs(12)
        );
    }
}
