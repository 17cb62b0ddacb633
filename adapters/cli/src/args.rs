//! Command-line flags and their layering over file configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use firebot_core::{MapId, OperatingMode};
use firebot_system_clock::SimulationConfig;

/// Headless firefighting robot simulator.
#[derive(Debug, Parser)]
#[command(name = "firebot", version, about)]
pub(crate) struct Cli {
    /// Map to load.
    #[arg(short, long)]
    pub(crate) map: Option<String>,

    /// Additional floor-plan catalog in TOML format.
    #[arg(long, value_name = "PATH")]
    pub(crate) maps: Option<PathBuf>,

    /// Operating mode.
    #[arg(long, value_enum)]
    pub(crate) mode: Option<ModeArg>,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 3000)]
    pub(crate) ticks: u64,

    /// Seed of every random stream.
    #[arg(short, long)]
    pub(crate) seed: Option<u64>,

    /// Simulation configuration in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Distance travelled per frame.
    #[arg(long)]
    pub(crate) speed: Option<f32>,

    /// Confidence a detection must reach, 0.0 to 1.0.
    #[arg(long)]
    pub(crate) confidence_threshold: Option<f32>,

    /// Share of clutter slots filled on map load, 0.0 to 1.0.
    #[arg(long)]
    pub(crate) obstacle_density: Option<f32>,

    /// Enables the battery model with the given drain per frame.
    #[arg(long)]
    pub(crate) battery_drain: Option<f32>,

    /// Frame output format.
    #[arg(long, value_enum, default_value_t = RenderArg::None)]
    pub(crate) render: RenderArg,

    /// Render one frame out of this many.
    #[arg(long, default_value_t = 60)]
    pub(crate) render_every: u64,

    /// Width of the ASCII canvas in characters.
    #[arg(long, default_value_t = 80)]
    pub(crate) columns: u32,

    /// Height of the ASCII canvas in characters.
    #[arg(long, default_value_t = 30)]
    pub(crate) rows: u32,

    /// List the available maps and exit.
    #[arg(long)]
    pub(crate) list_maps: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

/// Operating modes selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Patrol and head straight for fires.
    Fire,
    /// Patrol and follow planned routes to fires.
    Navigation,
    /// Full detect, navigate, aim, extinguish and verify mission.
    Full,
}

impl From<ModeArg> for OperatingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fire => Self::Fire,
            ModeArg::Navigation => Self::Navigation,
            ModeArg::Full => Self::Full,
        }
    }
}

/// Frame output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RenderArg {
    /// Narrative log only.
    None,
    /// ASCII floor plan on standard output.
    Ascii,
    /// One JSON scene per line on standard output.
    Json,
}

impl Cli {
    /// Overlays the flags that were given onto `config`.
    pub(crate) fn apply_overrides(&self, config: &mut SimulationConfig) {
        if let Some(map) = &self.map {
            config.map = MapId::new(map.as_str());
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(speed) = self.speed {
            config.motion.speed = speed;
        }
        if let Some(threshold) = self.confidence_threshold {
            config.fires.confidence_threshold = threshold;
        }
        if let Some(density) = self.obstacle_density {
            config.obstacle_density = density;
        }
        if let Some(drain) = self.battery_drain {
            config.battery.enabled = true;
            config.battery.drain_per_tick = drain;
        }
    }
}
