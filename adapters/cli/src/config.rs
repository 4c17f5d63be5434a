use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use bladeline_core::SimulationConfig;

/// Loads the simulation configuration, applying TOML overrides when a file is provided.
pub(crate) fn load(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse(contents: &str) -> Result<SimulationConfig> {
    let config: SimulationConfig =
        toml::from_str(contents).context("failed to parse simulation config toml contents")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &SimulationConfig) -> Result<()> {
    if config.rows == 0 || config.columns == 0 {
        bail!(
            "board dimensions must be positive (received {}x{})",
            config.rows,
            config.columns
        );
    }

    let durations = [
        ("time_limit", config.time_limit),
        ("move_duration", config.move_duration),
        ("turn_duration", config.turn_duration),
    ];
    for (name, value) in durations {
        if !(value > 0.0) {
            bail!("{name} must be positive (received {value})");
        }
    }

    if !(config.collision_radius >= 0.0) {
        bail!(
            "collision_radius must not be negative (received {})",
            config.collision_radius
        );
    }
    if !(config.obstacle_drop_delay >= 0.0) {
        bail!(
            "obstacle_drop_delay must not be negative (received {})",
            config.obstacle_drop_delay
        );
    }

    Ok(())
}
