#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Firebot simulation headlessly.

mod args;
mod output;

use std::{fs, io};

use anyhow::{Context, Result};
use clap::Parser;
use firebot_core::GeometryProvider;
use firebot_floor_plans::FloorPlanCatalog;
use firebot_rendering::{AsciiBackend, AsciiCanvas, RenderingBackend, Scene};
use firebot_system_clock::{Simulation, SimulationConfig};
use firebot_world::query;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use self::{
    args::{Cli, RenderArg},
    output::JsonLinesBackend,
};

/// Entry point for the Firebot command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let catalog = load_catalog(&cli)?;
    if cli.list_maps {
        for map in catalog.map_ids() {
            println!("{map}");
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let backend = select_backend(&cli)?;
    run(&cli, config, catalog, backend)
}

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn load_catalog(cli: &Cli) -> Result<FloorPlanCatalog> {
    let builtin = FloorPlanCatalog::builtin();
    let Some(path) = &cli.maps else {
        return Ok(builtin);
    };
    let extra = FloorPlanCatalog::from_path(path)
        .with_context(|| format!("failed to load floor plans from {}", path.display()))?;
    Ok(builtin.merged_with(extra))
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration at {}", path.display()))?;
            SimulationConfig::from_toml_str(&contents)
                .with_context(|| format!("failed to parse configuration at {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config
        .validate()
        .context("command-line flags produced an invalid configuration")?;
    Ok(config)
}

fn select_backend(cli: &Cli) -> Result<Option<Box<dyn RenderingBackend>>> {
    let backend: Box<dyn RenderingBackend> = match cli.render {
        RenderArg::None => return Ok(None),
        RenderArg::Ascii => {
            let canvas =
                AsciiCanvas::new(cli.columns, cli.rows).context("invalid ascii canvas size")?;
            Box::new(AsciiBackend::new(canvas, io::stdout()))
        }
        RenderArg::Json => Box::new(JsonLinesBackend::new(io::stdout())),
    };
    Ok(Some(backend))
}

fn run(
    cli: &Cli,
    config: SimulationConfig,
    catalog: FloorPlanCatalog,
    mut backend: Option<Box<dyn RenderingBackend>>,
) -> Result<()> {
    let map = config.map.clone();
    let mut simulation = Simulation::new(config, Box::new(catalog));
    println!("{}", query::welcome_banner(simulation.world()));

    let _ = simulation
        .select_map(&map)
        .with_context(|| format!("failed to load map `{map}`"))?;
    let _ = simulation.start();

    let render_every = cli.render_every.max(1);
    let mut frames = 0_u64;
    while frames < cli.ticks {
        let _ = simulation.advance();
        frames += 1;

        if let Some(backend) = backend.as_deref_mut() {
            if frames % render_every == 0 {
                present(&simulation, backend)?;
            }
        }

        if !query::is_running(simulation.world()) {
            break;
        }
    }

    if let Some(backend) = backend.as_deref_mut() {
        present(&simulation, backend)?;
        backend.finish()?;
    }

    let frame = simulation.frame();
    if query::is_running(simulation.world()) {
        let _ = simulation.stop();
    } else {
        info!(frames, "simulation stopped before the frame budget ran out");
    }
    info!(
        frames,
        state = frame.state.label(),
        elapsed_ms = frame.elapsed_ms,
        "run finished"
    );
    Ok(())
}

fn present(simulation: &Simulation, backend: &mut dyn RenderingBackend) -> Result<()> {
    let Some(field) = query::obstacle_field(simulation.world()) else {
        return Ok(());
    };
    backend.present(&Scene::from_frame(&simulation.frame(), field))
}
