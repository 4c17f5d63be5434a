#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative editable map state for the Bladeline planner.
//!
//! The world owns the only mutable copy of the board. Adapters edit it through
//! [`apply`], and searches run against the immutable snapshot returned by
//! [`query::grid_snapshot`].

use bladeline_core::{Command, EditError, Event, Grid, GridError, Position, SimulationConfig};
use log::debug;

/// Represents the authoritative map being edited.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    enemy_path: Vec<Position>,
    auto_obstacle: bool,
}

impl World {
    /// Creates an empty default-sized map with automatic obstacles enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::from_grid(Grid::default())
    }

    /// Creates an empty map sized by the provided configuration.
    pub fn with_config(config: &SimulationConfig) -> Result<Self, GridError> {
        Ok(Self::from_grid(config.empty_grid()?))
    }

    fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            enemy_path: Vec::new(),
            auto_obstacle: true,
        }
    }
}

fn reject(reason: EditError, out_events: &mut Vec<Event>) {
    debug!("rejected edit: {reason}");
    out_events.push(Event::CommandRejected { reason });
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetTile { position, tile } => {
            let Some(previous) = world.grid.tile(position) else {
                reject(EditError::OutOfBounds { position }, out_events);
                return;
            };
            if world.grid.set_tile(position, tile).is_err() {
                reject(EditError::OutOfBounds { position }, out_events);
                return;
            }
            out_events.push(Event::TileChanged {
                position,
                previous,
                tile,
            });
        }
        Command::TogglePathNode { position } => {
            if !world.grid.contains(position) {
                reject(EditError::OutOfBounds { position }, out_events);
                return;
            }

            if let Some(index) = world.enemy_path.iter().position(|node| *node == position) {
                let _ = world.enemy_path.remove(index);
                out_events.push(Event::PathNodeRemoved { position });
            } else {
                world.enemy_path.push(position);
                out_events.push(Event::PathNodeAdded { position });
            }
        }
        Command::ClearPath => {
            world.enemy_path.clear();
            out_events.push(Event::PathCleared);
        }
        Command::ResetGrid => {
            world.grid = Grid::new(world.grid.rows(), world.grid.columns()).unwrap_or_default();
            world.enemy_path.clear();
            out_events.push(Event::GridReset);
        }
        Command::SetAutoObstacle { enabled } => {
            world.auto_obstacle = enabled;
            out_events.push(Event::AutoObstacleChanged { enabled });
        }
        Command::LoadMap { grid, enemy_path } => {
            if let Some(position) = enemy_path.iter().find(|node| !grid.contains(**node)) {
                reject(
                    EditError::PathOutsideGrid {
                        position: *position,
                    },
                    out_events,
                );
                return;
            }

            out_events.push(Event::MapLoaded {
                rows: grid.rows(),
                columns: grid.columns(),
                path_nodes: enemy_path.len(),
            });
            world.grid = grid;
            world.enemy_path = enemy_path;
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use bladeline_core::{Grid, Position, Tile};

    /// Provides read-only access to the live grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures an immutable copy of the grid for a search.
    #[must_use]
    pub fn grid_snapshot(world: &World) -> Grid {
        world.grid.clone()
    }

    /// Enemy path nodes in the order they were added.
    #[must_use]
    pub fn enemy_path(world: &World) -> &[Position] {
        &world.enemy_path
    }

    /// Reports whether searches should explore obstacle placements.
    #[must_use]
    pub fn auto_obstacle_enabled(world: &World) -> bool {
        world.auto_obstacle
    }

    /// Reports whether a search has anything to aim at.
    ///
    /// True when an enemy path exists or any tile holds a boss.
    #[must_use]
    pub fn has_search_target(world: &World) -> bool {
        !world.enemy_path.is_empty() || world.grid.tiles().contains(&Tile::Boss)
    }
}
