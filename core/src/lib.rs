#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bladeline planner.
//!
//! This crate defines the data model that connects the trajectory simulator,
//! the candidate solver, the editable world, and the adapters. Every value
//! here is created fresh for a single search and never mutated once a
//! simulation has produced it. Systems receive an immutable [`Grid`] snapshot,
//! produce [`SimulationResult`] values, and the solver promotes the ones that
//! scored into ranked [`Candidate`] values.
//!
//! Map editing follows a command/event split: adapters submit [`Command`]
//! values, the world applies them and broadcasts [`Event`] values, and the
//! search only ever sees a grid snapshot taken between edits.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tile rows used by the default board.
pub const DEFAULT_ROWS: u32 = 9;

/// Number of tile columns used by the default board.
pub const DEFAULT_COLUMNS: u32 = 14;

/// Commands that express all permissible edits of the map.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the tile stored at a position.
    SetTile {
        /// Position of the tile to replace.
        position: Position,
        /// New content of the tile.
        tile: Tile,
    },
    /// Appends the position to the enemy path, or removes it when already present.
    TogglePathNode {
        /// Position to toggle.
        position: Position,
    },
    /// Removes every enemy path node.
    ClearPath,
    /// Empties every tile and clears the enemy path.
    ResetGrid,
    /// Enables or disables automatic obstacle placement during searches.
    SetAutoObstacle {
        /// Whether obstacle placements are explored.
        enabled: bool,
    },
    /// Replaces the whole map with a previously captured layout.
    LoadMap {
        /// Tile layout to install.
        grid: Grid,
        /// Enemy path to install.
        enemy_path: Vec<Position>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a tile was replaced.
    TileChanged {
        /// Position of the replaced tile.
        position: Position,
        /// Content before the edit.
        previous: Tile,
        /// Content after the edit.
        tile: Tile,
    },
    /// Confirms that a node was appended to the enemy path.
    PathNodeAdded {
        /// Position appended to the path.
        position: Position,
    },
    /// Confirms that a node was removed from the enemy path.
    PathNodeRemoved {
        /// Position removed from the path.
        position: Position,
    },
    /// Confirms that the enemy path was cleared.
    PathCleared,
    /// Confirms that every tile was emptied and the path cleared.
    GridReset,
    /// Announces the new automatic obstacle setting.
    AutoObstacleChanged {
        /// Whether obstacle placements are explored.
        enabled: bool,
    },
    /// Confirms that a map layout was installed.
    MapLoaded {
        /// Number of rows of the installed grid.
        rows: u32,
        /// Number of columns of the installed grid.
        columns: u32,
        /// Number of enemy path nodes installed.
        path_nodes: usize,
    },
    /// Reports that a command was rejected without modifying the world.
    CommandRejected {
        /// Specific reason the command failed.
        reason: EditError,
    },
}

/// Reasons an edit command may be rejected by the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditError {
    /// The edited position lies outside the grid.
    #[error("position {position} lies outside the grid")]
    OutOfBounds {
        /// Position that was rejected.
        position: Position,
    },
    /// A loaded enemy path references a position outside the loaded grid.
    #[error("enemy path node {position} lies outside the loaded grid")]
    PathOutsideGrid {
        /// First offending path node.
        position: Position,
    },
}

/// Kind of content occupying a single grid tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Open floor. The only tile a shooter or an obstacle may occupy.
    #[default]
    Empty,
    /// Solid tile that deflects the sword.
    Wall,
    /// Passable tile on which nothing may be placed.
    Forbidden,
    /// Passable tile that acts as an area hit zone.
    Boss,
}

impl Tile {
    /// Numeric code used by the map transfer format.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Wall => 1,
            Self::Forbidden => 2,
            Self::Boss => 3,
        }
    }

    /// Resolves a tile from its numeric transfer code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Wall),
            2 => Some(Self::Forbidden),
            3 => Some(Self::Boss),
            _ => None,
        }
    }

    /// Reports whether the tile stops the sword from entering it.
    ///
    /// Boss tiles never block movement.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Cardinal facing of the sword, cyclically ordered clockwise.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Direction {
    /// Travel toward decreasing row indices.
    Up,
    /// Travel toward increasing column indices.
    Right,
    /// Travel toward increasing row indices.
    Down,
    /// Travel toward decreasing column indices.
    Left,
}

impl Direction {
    /// All directions in rotation order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Direction reached after a single clockwise turn.
    #[must_use]
    pub const fn turned_clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Row and column deltas of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Right => (0, 1),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        };
        f.write_str(label)
    }
}

/// Location of a single grid tile expressed as row and column indices.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    row: u32,
    column: u32,
}

impl Position {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Position one step away in the provided direction.
    ///
    /// Returns `None` when the step would underflow the grid origin. Upper
    /// bounds are checked by [`Grid::neighbor`].
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (row_delta, column_delta) = direction.delta();
        Some(Self {
            row: self.row.checked_add_signed(row_delta)?,
            column: self.column.checked_add_signed(column_delta)?,
        })
    }

    /// Euclidean distance between two tile positions measured in tiles.
    #[must_use]
    pub fn distance(self, other: Position) -> f64 {
        let rows = f64::from(self.row.abs_diff(other.row));
        let columns = f64::from(self.column.abs_diff(other.column));
        (rows * rows + columns * columns).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Reasons a grid cannot be constructed or edited.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The grid must contain at least one row and one column.
    #[error("grid dimensions must be positive (received {rows}x{columns})")]
    EmptyDimensions {
        /// Requested number of rows.
        rows: u32,
        /// Requested number of columns.
        columns: u32,
    },
    /// The tile buffer does not match the requested dimensions.
    #[error("expected {expected} tiles but received {actual}")]
    TileCountMismatch {
        /// Number of tiles implied by the dimensions.
        expected: usize,
        /// Number of tiles supplied.
        actual: usize,
    },
    /// A row of a nested tile layout has a different width than the first row.
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// The position lies outside the grid.
    #[error("position {position} lies outside the grid")]
    OutOfBounds {
        /// Position that was rejected.
        position: Position,
    },
}

/// Dense row-major tile layout of the board.
///
/// A grid handed to the simulator or solver is a snapshot: systems only ever
/// borrow it immutably.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridParts")]
pub struct Grid {
    rows: u32,
    columns: u32,
    tiles: Vec<Tile>,
}

/// Unvalidated wire form of a [`Grid`].
#[derive(Deserialize)]
struct GridParts {
    rows: u32,
    columns: u32,
    tiles: Vec<Tile>,
}

impl TryFrom<GridParts> for Grid {
    type Error = GridError;

    fn try_from(parts: GridParts) -> Result<Self, Self::Error> {
        Self::from_tiles(parts.rows, parts.columns, parts.tiles)
    }
}

impl Grid {
    /// Creates a grid of the provided dimensions filled with empty tiles.
    pub fn new(rows: u32, columns: u32) -> Result<Self, GridError> {
        let count = tile_count(rows, columns)?;
        Ok(Self {
            rows,
            columns,
            tiles: vec![Tile::Empty; count],
        })
    }

    /// Creates a grid from a row-major tile buffer.
    pub fn from_tiles(rows: u32, columns: u32, tiles: Vec<Tile>) -> Result<Self, GridError> {
        let expected = tile_count(rows, columns)?;
        if tiles.len() != expected {
            return Err(GridError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        Ok(Self {
            rows,
            columns,
            tiles,
        })
    }

    /// Creates a grid from nested rows of tiles.
    pub fn from_rows(rows: &[Vec<Tile>]) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: index,
                    expected: width,
                    actual: row.len(),
                });
            }
            tiles.extend_from_slice(row);
        }

        let row_count = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let column_count = u32::try_from(width).unwrap_or(u32::MAX);
        Self::from_tiles(row_count, column_count, tiles)
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Row-major view of every tile.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Reports whether the position lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.row() < self.rows && position.column() < self.columns
    }

    /// Tile stored at the provided position, if it lies within the grid.
    #[must_use]
    pub fn tile(&self, position: Position) -> Option<Tile> {
        self.index(position)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the position holds an empty tile.
    #[must_use]
    pub fn is_empty_tile(&self, position: Position) -> bool {
        self.tile(position) == Some(Tile::Empty)
    }

    /// Replaces the tile at the provided position.
    pub fn set_tile(&mut self, position: Position, tile: Tile) -> Result<(), GridError> {
        let slot = self
            .index(position)
            .and_then(|index| self.tiles.get_mut(index))
            .ok_or(GridError::OutOfBounds { position })?;
        *slot = tile;
        Ok(())
    }

    /// Builder-style variant of [`Grid::set_tile`].
    pub fn with_tile(mut self, position: Position, tile: Tile) -> Result<Self, GridError> {
        self.set_tile(position, tile)?;
        Ok(self)
    }

    /// Neighboring position in the provided direction, if it lies on the grid.
    #[must_use]
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        position
            .step(direction)
            .filter(|candidate| self.contains(*candidate))
    }

    /// Iterator over every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| Position::new(row, column)))
    }

    /// First boss tile encountered in row-major order.
    #[must_use]
    pub fn first_boss(&self) -> Option<Position> {
        self.positions()
            .find(|position| self.tile(*position) == Some(Tile::Boss))
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.row()).ok()?;
        let column = usize::try_from(position.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

impl Default for Grid {
    fn default() -> Self {
        let count = (DEFAULT_ROWS * DEFAULT_COLUMNS) as usize;
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            tiles: vec![Tile::Empty; count],
        }
    }
}

fn tile_count(rows: u32, columns: u32) -> Result<usize, GridError> {
    if rows == 0 || columns == 0 {
        return Err(GridError::EmptyDimensions { rows, columns });
    }
    Ok(rows as usize * columns as usize)
}

/// Whether an obstacle exists from the start or drops in later.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ObstacleKind {
    /// Present from the first evaluation.
    Static,
    /// Becomes blocking once its activation time is reached.
    Dynamic,
}

/// Single blocking tile used to redirect the sword.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    position: Position,
    activation_time: f64,
}

impl Obstacle {
    /// Creates an obstacle that blocks from the start of the simulation.
    #[must_use]
    pub const fn fixed(position: Position) -> Self {
        Self {
            position,
            activation_time: 0.0,
        }
    }

    /// Creates an obstacle that blocks once `activation_time` seconds elapsed.
    ///
    /// A non-positive activation time yields a static obstacle.
    #[must_use]
    pub fn delayed(position: Position, activation_time: f64) -> Self {
        Self {
            position,
            activation_time: activation_time.max(0.0),
        }
    }

    /// Tile occupied by the obstacle.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Elapsed time at which the obstacle starts blocking.
    #[must_use]
    pub const fn activation_time(&self) -> f64 {
        self.activation_time
    }

    /// Static when active from the start, dynamic otherwise.
    #[must_use]
    pub fn kind(&self) -> ObstacleKind {
        if self.activation_time > 0.0 {
            ObstacleKind::Dynamic
        } else {
            ObstacleKind::Static
        }
    }

    /// Reports whether the obstacle blocks `position` at the provided time.
    #[must_use]
    pub fn blocks(&self, position: Position, elapsed: f64) -> bool {
        self.position == position && elapsed >= self.activation_time
    }
}

/// Event that produced a [`PathNode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathAction {
    /// Initial placement at the shooter tile.
    Start,
    /// Advance into the neighboring tile.
    Move,
    /// Clockwise rotation in place after hitting a blocker.
    Turn,
}

/// One instant of a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    /// Tile occupied by the sword.
    pub position: Position,
    /// Facing after any turn performed at this instant.
    pub direction: Direction,
    /// Simulated seconds elapsed since firing.
    pub time: f64,
    /// Whether a hit was credited at this instant.
    pub hit: bool,
    /// Event that produced the node.
    pub action: PathAction,
}

/// Aggregate outcome of a single simulated shot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Number of hits credited over the whole trajectory.
    pub hits: u32,
    /// Time-ordered trajectory, starting with a [`PathAction::Start`] node.
    pub path: Vec<PathNode>,
    /// Tile the sword was fired from.
    pub shooter: Position,
    /// Initial facing of the sword.
    pub direction: Direction,
    /// Target the hits were scored against.
    pub target: Position,
    /// Obstacle present during the simulation, if any.
    pub obstacle: Option<Obstacle>,
}

impl SimulationResult {
    /// Deduplication key of the shot.
    #[must_use]
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            shooter: self.shooter,
            direction: self.direction,
            obstacle: self.obstacle.as_ref().map(ObstacleFingerprint::of),
        }
    }

    /// Nodes at which a hit was credited.
    pub fn hit_nodes(&self) -> impl Iterator<Item = &PathNode> {
        self.path.iter().filter(|node| node.hit)
    }
}

/// Simulation result retained by the solver because it scored at least once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(SimulationResult);

impl Candidate {
    /// Number of hits credited to the candidate.
    #[must_use]
    pub const fn hits(&self) -> u32 {
        self.0.hits
    }

    /// Borrows the underlying simulation result.
    #[must_use]
    pub const fn result(&self) -> &SimulationResult {
        &self.0
    }

    /// Consumes the candidate, yielding the simulation result.
    #[must_use]
    pub fn into_result(self) -> SimulationResult {
        self.0
    }

    /// Deduplication key of the candidate.
    #[must_use]
    pub fn key(&self) -> CandidateKey {
        self.0.key()
    }
}

impl TryFrom<SimulationResult> for Candidate {
    type Error = SimulationResult;

    /// Promotes a result that scored; hands back results without hits.
    fn try_from(result: SimulationResult) -> Result<Self, Self::Error> {
        if result.hits > 0 {
            Ok(Self(result))
        } else {
            Err(result)
        }
    }
}

/// Obstacle descriptor that ignores the activation time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObstacleFingerprint {
    /// Tile occupied by the obstacle.
    pub position: Position,
    /// Whether the obstacle was static or dynamic.
    pub kind: ObstacleKind,
}

impl ObstacleFingerprint {
    /// Derives the fingerprint of an obstacle.
    #[must_use]
    pub fn of(obstacle: &Obstacle) -> Self {
        Self {
            position: obstacle.position(),
            kind: obstacle.kind(),
        }
    }
}

/// Identity of a firing solution used to deduplicate candidates.
///
/// The derived ordering (shooter row, shooter column, direction, no obstacle
/// first, then obstacle position and kind) is the ranking tie-break.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CandidateKey {
    /// Tile the sword was fired from.
    pub shooter: Position,
    /// Initial facing of the sword.
    pub direction: Direction,
    /// Obstacle descriptor, if an obstacle was used.
    pub obstacle: Option<ObstacleFingerprint>,
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.shooter, self.direction)?;
        match self.obstacle {
            Some(ObstacleFingerprint {
                position,
                kind: ObstacleKind::Static,
            }) => write!(f, " static obstacle at {position}"),
            Some(ObstacleFingerprint {
                position,
                kind: ObstacleKind::Dynamic,
            }) => write!(f, " dynamic obstacle at {position}"),
            None => Ok(()),
        }
    }
}

/// Tunable constants of the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of rows of a freshly created board.
    pub rows: u32,
    /// Number of columns of a freshly created board.
    pub columns: u32,
    /// Simulated seconds after which a shot ends.
    pub time_limit: f64,
    /// Seconds needed to advance a single tile.
    pub move_duration: f64,
    /// Seconds needed to rotate after hitting a blocker.
    pub turn_duration: f64,
    /// Euclidean hit radius measured in tiles.
    pub collision_radius: f64,
    /// Delay between the sword's first visit of a tile and a dynamic obstacle drop there.
    pub obstacle_drop_delay: f64,
}

impl SimulationConfig {
    /// Creates an empty board using the configured dimensions.
    pub fn empty_grid(&self) -> Result<Grid, GridError> {
        Grid::new(self.rows, self.columns)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            time_limit: 20.0,
            move_duration: 1.0 / 1.3,
            turn_duration: 0.25,
            collision_radius: 1.5,
            obstacle_drop_delay: 0.1,
        }
    }
}
