#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fire lifecycle system: ignition, detection scans and identity-guarded
//! timeouts for the single fire slot.

mod sampler;

use std::time::Duration;

use firebot_core::{
    Command, ControllerState, Event, Fire, FireClearReason, LogLevel, SimulationView, Timer,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub use sampler::{FreePointSampler, DEFAULT_SAMPLE_TRIES, FALLBACK_POINT};

/// Tunables governing when and where fires appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Per-tick ignition probability while patrolling in the collapsed cycle.
    pub ignition_chance: f64,
    /// Minimum distance between a new fire and the robot.
    pub min_robot_distance: f32,
    /// Extra samples drawn when a candidate lies too close to the robot.
    pub resample_attempts: u32,
    /// Lower bound of the synthesized detection confidence.
    pub confidence_min: f32,
    /// Upper bound of the synthesized detection confidence.
    pub confidence_max: f32,
    /// Confidence a detection must reach to produce a fire.
    pub confidence_threshold: f32,
    /// Fire lifetime in the collapsed cycle.
    pub collapsed_timeout: Duration,
    /// Fire lifetime in the full mission.
    pub full_timeout: Duration,
    /// Duration of a full-mission detection scan.
    pub scan_duration: Duration,
    /// Seed of the ignition random stream.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignition_chance: 0.005,
            min_robot_distance: 150.0,
            resample_attempts: 4,
            confidence_min: 0.75,
            confidence_max: 0.95,
            confidence_threshold: 0.5,
            collapsed_timeout: Duration::from_millis(5000),
            full_timeout: Duration::from_millis(20_000),
            scan_duration: Duration::from_millis(2500),
            rng_seed: 0,
        }
    }
}

/// How fires come into existence during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ignition {
    /// Random ignition on ticks spent patrolling.
    Random,
    /// A detection scan each time the controller enters `DETECT`.
    Scan,
}

/// Pure system that owns fire creation and expiry requests.
#[derive(Debug)]
pub struct FireLifecycle {
    config: Config,
    rng: ChaCha8Rng,
    sampler: FreePointSampler,
    ignition: Option<Ignition>,
    timeout: Duration,
}

impl FireLifecycle {
    /// Creates the system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config, sampler: FreePointSampler) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            sampler,
            ignition: None,
            timeout: config.collapsed_timeout,
        }
    }

    /// Replaces the confidence a detection must reach. Values are clamped to
    /// the unit interval.
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        if threshold.is_finite() {
            self.config.confidence_threshold = threshold.clamp(0.0, 1.0);
        }
    }

    /// Confidence a detection must currently reach.
    #[must_use]
    pub fn confidence_threshold(&self) -> f32 {
        self.config.confidence_threshold
    }

    /// Consumes world events and the simulation view to emit fire commands.
    pub fn handle(&mut self, events: &[Event], view: &SimulationView<'_>, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SimulationStarted { mode } => {
                    if mode.runs_full_mission() {
                        self.ignition = Some(Ignition::Scan);
                        self.timeout = self.config.full_timeout;
                    } else {
                        self.ignition = Some(Ignition::Random);
                        self.timeout = self.config.collapsed_timeout;
                    }
                }
                Event::SimulationStopped => self.ignition = None,
                Event::TimeAdvanced { .. } => self.maybe_ignite(view, out),
                Event::StateEntered {
                    state: ControllerState::Detect,
                    ..
                } => self.begin_scan(view, out),
                Event::TimerElapsed {
                    timer:
                        Timer::Dwell {
                            state: ControllerState::Detect,
                        },
                } => self.finish_scan(view, out),
                Event::FireSpawned { fire } => self.arm_timeout(fire, out),
                Event::TimerElapsed {
                    timer: Timer::FireTimeout { fire },
                } => {
                    out.push(Command::ExpireFire { fire: *fire });
                }
                Event::FireCleared {
                    reason: FireClearReason::TimedOut,
                    ..
                } => out.push(Command::Announce {
                    level: LogLevel::Error,
                    message: "Fire timed out! Relocating...".to_owned(),
                }),
                _ => {}
            }
        }
    }

    fn maybe_ignite(&mut self, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        if self.ignition != Some(Ignition::Random) || !view.running {
            return;
        }
        if view.state != ControllerState::Patrolling || view.fire.is_some() {
            return;
        }
        let chance = self.config.ignition_chance;
        if !chance.is_finite() || !self.rng.gen_bool(chance.clamp(0.0, 1.0)) {
            return;
        }

        let _ = self.try_spawn(view, out);
    }

    fn begin_scan(&mut self, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        if self.ignition != Some(Ignition::Scan) || !view.running || view.fire.is_some() {
            return;
        }

        out.push(Command::Announce {
            level: LogLevel::Warning,
            message: "[DETECT] Scanning environment for fire...".to_owned(),
        });
        self.schedule_scan(out);
    }

    fn finish_scan(&mut self, view: &SimulationView<'_>, out: &mut Vec<Command>) {
        if self.ignition != Some(Ignition::Scan) || view.fire.is_some() {
            return;
        }

        if !self.try_spawn(view, out) {
            self.schedule_scan(out);
        }
    }

    fn schedule_scan(&self, out: &mut Vec<Command>) {
        out.push(Command::ScheduleTimer {
            delay: self.config.scan_duration,
            timer: Timer::Dwell {
                state: ControllerState::Detect,
            },
        });
    }

    fn arm_timeout(&self, fire: &Fire, out: &mut Vec<Command>) {
        let message = match self.ignition {
            Some(Ignition::Scan) => format!(
                "[DETECT] Fire detected - confidence: {:.2}",
                fire.confidence
            ),
            _ => format!(
                "Fire detected at [{}, {}]",
                fire.position.x().floor(),
                fire.position.y().floor()
            ),
        };
        out.push(Command::Announce {
            level: LogLevel::Error,
            message,
        });
        out.push(Command::ScheduleTimer {
            delay: self.timeout,
            timer: Timer::FireTimeout { fire: fire.id },
        });
    }

    /// Synthesizes a detection and, when it clears the threshold, requests a
    /// fire far enough from the robot. Returns whether a spawn was requested.
    fn try_spawn(&mut self, view: &SimulationView<'_>, out: &mut Vec<Command>) -> bool {
        let Some(field) = view.field else {
            return false;
        };

        let (low, high) = if self.config.confidence_min <= self.config.confidence_max {
            (self.config.confidence_min, self.config.confidence_max)
        } else {
            (self.config.confidence_max, self.config.confidence_min)
        };
        let confidence = self.rng.gen_range(low..=high);
        if confidence < self.config.confidence_threshold {
            out.push(Command::Announce {
                level: LogLevel::Info,
                message: format!(
                    "[DETECT] Signal below threshold ({confidence:.2} < {:.2})",
                    self.config.confidence_threshold
                ),
            });
            return false;
        }

        for _ in 0..=self.config.resample_attempts {
            let position = self.sampler.sample(&mut self.rng, field);
            if position.distance_to(view.robot) >= self.config.min_robot_distance {
                out.push(Command::SpawnFire {
                    position,
                    confidence,
                });
                return true;
            }
        }

        debug!("no fire site far enough from the robot; skipping ignition");
        false
    }
}
