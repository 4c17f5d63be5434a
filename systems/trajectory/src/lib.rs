#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that traces a bouncing sword across a grid snapshot.
//!
//! A shot is a state machine over `(position, direction, elapsed, locked)`.
//! Each step either moves the sword one tile forward or, when the next tile
//! is blocked, rotates it clockwise in place. Hits are credited at most once
//! per straight line of travel: the lock is set by any credited hit and only
//! released by a turn performed outside the hit zone.

use bladeline_core::{
    Direction, Grid, Obstacle, PathAction, PathNode, Position, SimulationConfig, SimulationResult,
    Tile,
};

/// Trajectory simulator bound to a simulation configuration.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    config: SimulationConfig,
}

impl Trajectory {
    /// Creates a simulator using the provided configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Configuration used by every simulated shot.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulates a single shot until the configured time limit elapses.
    ///
    /// # Panics
    ///
    /// Panics when the shooter or the target lies outside the grid.
    #[must_use]
    pub fn simulate(
        &self,
        shooter: Position,
        direction: Direction,
        grid: &Grid,
        target: Position,
        obstacle: Option<Obstacle>,
    ) -> SimulationResult {
        assert!(
            grid.contains(shooter),
            "shooter {shooter} lies outside the {}x{} grid",
            grid.rows(),
            grid.columns()
        );
        assert!(
            grid.contains(target),
            "target {target} lies outside the {}x{} grid",
            grid.rows(),
            grid.columns()
        );

        let arena = Arena {
            grid,
            obstacle: obstacle.as_ref(),
            zone: HitZone::new(grid, target, self.config.collision_radius),
            config: &self.config,
        };

        let (mut state, start) = SwordState::fire(shooter, direction, &arena.zone);
        let mut path = vec![start];
        while state.elapsed < self.config.time_limit {
            let (next, node) = state.step(&arena);
            path.push(node);
            state = next;
        }

        SimulationResult {
            hits: state.hits,
            path,
            shooter,
            direction,
            target,
            obstacle,
        }
    }

    /// Reports whether `position` lies in the hit zone of `target` or of a boss tile.
    #[must_use]
    pub fn is_hit(&self, grid: &Grid, position: Position, target: Position) -> bool {
        HitZone::new(grid, target, self.config.collision_radius).contains(position)
    }
}

/// Simulates a single shot using the default configuration.
#[must_use]
pub fn simulate(
    shooter: Position,
    direction: Direction,
    grid: &Grid,
    target: Position,
    obstacle: Option<Obstacle>,
) -> SimulationResult {
    Trajectory::default().simulate(shooter, direction, grid, target, obstacle)
}

/// Reports whether `position` is within the default collision radius of the
/// target or of any boss tile.
#[must_use]
pub fn is_hit(grid: &Grid, position: Position, target: Position) -> bool {
    Trajectory::default().is_hit(grid, position, target)
}

#[derive(Clone, Copy, Debug)]
struct Arena<'a> {
    grid: &'a Grid,
    obstacle: Option<&'a Obstacle>,
    zone: HitZone<'a>,
    config: &'a SimulationConfig,
}

impl Arena<'_> {
    /// Tile the sword would enter, or `None` when the way ahead is blocked.
    fn open_neighbor(
        &self,
        position: Position,
        direction: Direction,
        elapsed: f64,
    ) -> Option<Position> {
        let next = self.grid.neighbor(position, direction)?;
        let walled = self.grid.tile(next).map_or(true, Tile::blocks_movement);
        let obstructed = self
            .obstacle
            .is_some_and(|obstacle| obstacle.blocks(next, elapsed));
        if walled || obstructed {
            None
        } else {
            Some(next)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct HitZone<'a> {
    grid: &'a Grid,
    target: Position,
    radius: f64,
    reach: u32,
}

impl<'a> HitZone<'a> {
    fn new(grid: &'a Grid, target: Position, radius: f64) -> Self {
        Self {
            grid,
            target,
            radius,
            reach: radius.max(0.0).ceil() as u32,
        }
    }

    fn contains(&self, position: Position) -> bool {
        if position.distance(self.target) <= self.radius {
            return true;
        }

        let last_row = self.grid.rows().saturating_sub(1);
        let last_column = self.grid.columns().saturating_sub(1);
        let rows = position.row().saturating_sub(self.reach)
            ..=position.row().saturating_add(self.reach).min(last_row);
        let columns = position.column().saturating_sub(self.reach)
            ..=position.column().saturating_add(self.reach).min(last_column);

        rows.flat_map(|row| columns.clone().map(move |column| Position::new(row, column)))
            .any(|cell| {
                self.grid.tile(cell) == Some(Tile::Boss)
                    && position.distance(cell) <= self.radius
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SwordState {
    position: Position,
    direction: Direction,
    elapsed: f64,
    locked: bool,
    hits: u32,
}

impl SwordState {
    fn fire(shooter: Position, direction: Direction, zone: &HitZone<'_>) -> (Self, PathNode) {
        let hit = zone.contains(shooter);
        let state = Self {
            position: shooter,
            direction,
            elapsed: 0.0,
            locked: hit,
            hits: u32::from(hit),
        };
        (state, state.node(hit, PathAction::Start))
    }

    fn step(self, arena: &Arena<'_>) -> (Self, PathNode) {
        let ahead = arena.open_neighbor(self.position, self.direction, self.elapsed);
        match ahead {
            Some(next) => self.advance(next, arena),
            None => self.turn(arena),
        }
    }

    fn turn(self, arena: &Arena<'_>) -> (Self, PathNode) {
        let hit = arena.zone.contains(self.position);
        let next = Self {
            direction: self.direction.turned_clockwise(),
            elapsed: self.elapsed + arena.config.turn_duration,
            // a hit at the turn arms the lock for the outgoing line
            locked: hit,
            hits: self.hits + u32::from(hit),
            ..self
        };
        (next, next.node(hit, PathAction::Turn))
    }

    fn advance(self, destination: Position, arena: &Arena<'_>) -> (Self, PathNode) {
        let hit = !self.locked && arena.zone.contains(destination);
        let next = Self {
            position: destination,
            elapsed: self.elapsed + arena.config.move_duration,
            locked: self.locked || hit,
            hits: self.hits + u32::from(hit),
            ..self
        };
        (next, next.node(hit, PathAction::Move))
    }

    fn node(&self, hit: bool, action: PathAction) -> PathNode {
        PathNode {
            position: self.position,
            direction: self.direction,
            time: self.elapsed,
            hit,
            action,
        }
    }
}
