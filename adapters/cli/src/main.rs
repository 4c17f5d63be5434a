#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that searches a Bladeline map for its best shots.

mod config;
mod map_transfer;
mod report;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use bladeline_core::{Command, Event};
use bladeline_system_solver::Solver;
use bladeline_world::{apply, query, World};
use clap::Parser;
use log::{info, LevelFilter};

use crate::{
    map_transfer::MapSnapshot,
    report::{JsonReport, NO_TARGET_GUIDANCE},
};

/// Command-line arguments accepted by the planner.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map file holding a `blade:v1:` transfer string or a plain JSON layout.
    #[arg(long)]
    map: Option<PathBuf>,

    /// TOML file overriding simulation constants.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the obstacle-assisted variants of every shot.
    #[arg(long)]
    no_auto_obstacle: bool,

    /// Number of ranked candidates to print.
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,

    /// Print the loaded map as a transfer string instead of searching it.
    #[arg(long)]
    export: bool,

    /// Log level (off, error, warn, info, debug, trace); `RUST_LOG` refines it.
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

/// Entry point for the Bladeline command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    let config = config::load(args.config.as_deref())?;
    let mut world = World::with_config(&config).context("invalid board dimensions in config")?;
    let mut events = Vec::new();

    if let Some(path) = &args.map {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read map file at {}", path.display()))?;
        let snapshot = MapSnapshot::parse(&contents)
            .with_context(|| format!("failed to load map from {}", path.display()))?;
        apply(&mut world, snapshot.into_command(), &mut events);
    }
    if args.no_auto_obstacle {
        apply(
            &mut world,
            Command::SetAutoObstacle { enabled: false },
            &mut events,
        );
    }

    for event in &events {
        match event {
            Event::CommandRejected { reason } => bail!("map rejected: {reason}"),
            Event::MapLoaded {
                rows,
                columns,
                path_nodes,
            } => info!("loaded {columns}x{rows} map with {path_nodes} enemy path node(s)"),
            _ => {}
        }
    }

    if args.export {
        let snapshot = MapSnapshot {
            grid: query::grid_snapshot(&world),
            enemy_path: query::enemy_path(&world).to_vec(),
        };
        println!("{}", snapshot.encode());
        return Ok(());
    }

    if !query::has_search_target(&world) && !args.json {
        println!("{NO_TARGET_GUIDANCE}");
        return Ok(());
    }

    let grid = query::grid_snapshot(&world);
    let outcome = Solver::new(config).search(
        &grid,
        query::enemy_path(&world),
        query::auto_obstacle_enabled(&world),
    );

    if args.json {
        let json = serde_json::to_string_pretty(&JsonReport::new(&outcome, args.top))
            .context("failed to serialise search outcome")?;
        println!("{json}");
    } else {
        print!("{}", report::render_text(&outcome, args.top));
    }

    Ok(())
}

fn init_logging(level: LevelFilter) {
    if let Err(error) = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init()
    {
        eprintln!("warning: failed to initialise logger: {error}");
    }
}
