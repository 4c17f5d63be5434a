#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-indexed queries used by adapters that replay a simulated shot.
//!
//! Everything here is derived from the recorded path of a
//! [`SimulationResult`]; nothing re-runs the simulation.

use bladeline_core::{Direction, Obstacle, PathNode, Position, SimulationResult};
use glam::Vec2;
use thiserror::Error;

/// Number of samples drawn along the sword trail.
pub const TRAIL_SAMPLES: usize = 22;

/// Time between consecutive trail samples, in seconds.
pub const TRAIL_STEP: f64 = 0.028;

/// Tolerance within which a query at the final node still resolves.
const END_TOLERANCE: f64 = 0.001;

/// Describes how grid tiles map onto world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackGrid {
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
}

impl PlaybackGrid {
    /// Creates a new grid descriptor.
    ///
    /// Returns an error when `tile_length` is not strictly positive.
    pub fn new(rows: u32, columns: u32, tile_length: f32) -> Result<Self, PlaybackError> {
        if !(tile_length > 0.0) {
            return Err(PlaybackError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            rows,
            columns,
            tile_length,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Resolves the tile containing a world-space position.
    ///
    /// Returns `None` when the position lies outside the grid.
    #[must_use]
    pub fn tile_at(&self, world: Vec2) -> Option<Position> {
        if world.x < 0.0 || world.y < 0.0 {
            return None;
        }

        let column = (world.x / self.tile_length).floor();
        let row = (world.y / self.tile_length).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(Position::new(row as u32, column as u32))
    }

    /// World-space location of a tile's origin corner.
    #[must_use]
    pub fn tile_origin(&self, position: Position) -> Vec2 {
        to_world(position, self.tile_length)
    }
}

/// Interpolated sword location at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwordPose {
    /// World-space location, x along columns and y along rows.
    pub world: Vec2,
    /// Facing at the start of the active segment.
    pub direction: Direction,
}

/// Activation state of an obstacle at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObstacleState {
    /// The obstacle blocks the sword.
    Active,
    /// The obstacle has not dropped yet.
    Pending {
        /// Seconds left until the obstacle activates.
        remaining: f64,
    },
}

/// Locates the path segment active at `time`.
///
/// Returns the index `i` with `path[i].time <= time < path[i + 1].time`.
#[must_use]
pub fn segment_at(path: &[PathNode], time: f64) -> Option<usize> {
    path.windows(2)
        .position(|pair| time >= pair[0].time && time < pair[1].time)
}

/// Interpolates the sword pose at `time`.
///
/// Returns `None` before the first node and after the last one, except within
/// a millisecond of the final node where the final position is reported.
#[must_use]
pub fn sword_pose_at(path: &[PathNode], time: f64, tile_length: f32) -> Option<SwordPose> {
    let (first, last) = (path.first()?, path.last()?);
    if time < first.time || time > last.time {
        return None;
    }

    if let Some(index) = segment_at(path, time) {
        let (current, next) = (&path[index], &path[index + 1]);
        let span = next.time - current.time;
        let progress = ((time - current.time) / span) as f32;
        let from = to_world(current.position, tile_length);
        let to = to_world(next.position, tile_length);
        return Some(SwordPose {
            world: from.lerp(to, progress),
            direction: current.direction,
        });
    }

    ((time - last.time).abs() < END_TOLERANCE).then(|| SwordPose {
        world: to_world(last.position, tile_length),
        direction: last.direction,
    })
}

/// Samples the trail behind the sword, newest first.
///
/// Samples that fall outside the path are skipped.
#[must_use]
pub fn sword_trail(path: &[PathNode], time: f64, tile_length: f32) -> Vec<SwordPose> {
    (0..TRAIL_SAMPLES)
        .filter_map(|sample| sword_pose_at(path, time - sample as f64 * TRAIL_STEP, tile_length))
        .collect()
}

/// Number of hits the shot has scored by `time`.
#[must_use]
pub fn combo_at(result: &SimulationResult, time: f64) -> u32 {
    let combo = result
        .path
        .iter()
        .filter(|node| node.hit && node.time <= time)
        .count();
    u32::try_from(combo).unwrap_or(u32::MAX)
}

/// Reports whether an obstacle blocks at `time`.
#[must_use]
pub fn obstacle_state_at(obstacle: &Obstacle, time: f64) -> ObstacleState {
    if time >= obstacle.activation_time() {
        ObstacleState::Active
    } else {
        ObstacleState::Pending {
            remaining: obstacle.activation_time() - time,
        }
    }
}

fn to_world(position: Position, tile_length: f32) -> Vec2 {
    Vec2::new(position.column() as f32, position.row() as f32) * tile_length
}

/// Errors that can occur when constructing playback descriptors.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum PlaybackError {
    /// Tile length must be positive to map world space onto tiles.
    #[error("tile_length must be positive (received {tile_length})")]
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use bladeline_core::PathAction;

    fn node(row: u32, column: u32, direction: Direction, time: f64, hit: bool) -> PathNode {
        PathNode {
            position: Position::new(row, column),
            direction,
            time,
            hit,
            action: PathAction::Move,
        }
    }

    fn sample_path() -> Vec<PathNode> {
        vec![
            node(0, 0, Direction::Right, 0.0, false),
            node(0, 1, Direction::Right, 1.0, true),
            node(0, 1, Direction::Down, 1.25, true),
            node(1, 1, Direction::Down, 2.25, false),
        ]
    }

    #[test]
    fn grid_rejects_non_positive_tile_length() {
        assert_eq!(
            PlaybackGrid::new(9, 14, 0.0),
            Err(PlaybackError::InvalidTileLength { tile_length: 0.0 })
        );
        assert!(PlaybackGrid::new(9, 14, -4.0).is_err());
        assert!(PlaybackGrid::new(9, 14, f32::NAN).is_err());
    }

    #[test]
    fn tile_at_floors_world_coordinates() {
        let grid = PlaybackGrid::new(9, 14, 40.0).expect("valid grid");

        assert_eq!(grid.tile_at(Vec2::new(0.0, 0.0)), Some(Position::new(0, 0)));
        assert_eq!(
            grid.tile_at(Vec2::new(79.9, 40.0)),
            Some(Position::new(1, 1))
        );
        assert_eq!(
            grid.tile_at(Vec2::new(559.0, 359.0)),
            Some(Position::new(8, 13))
        );
        assert_eq!(grid.width(), 560.0);
        assert_eq!(grid.height(), 360.0);
        assert_eq!(grid.tile_at(Vec2::new(grid.width(), 10.0)), None);
        assert_eq!(grid.tile_at(Vec2::new(10.0, grid.height())), None);
        assert_eq!(grid.tile_at(Vec2::new(10.0, -0.5)), None);
        assert_eq!(grid.tile_origin(Position::new(2, 3)), Vec2::new(120.0, 80.0));
    }

    #[test]
    fn segment_lookup_uses_half_open_intervals() {
        let path = sample_path();

        assert_eq!(segment_at(&path, 0.0), Some(0));
        assert_eq!(segment_at(&path, 1.0), Some(1));
        assert_eq!(segment_at(&path, 2.0), Some(2));
        assert_eq!(segment_at(&path, 2.25), None);
        assert_eq!(segment_at(&path, -0.1), None);
    }

    #[test]
    fn pose_interpolates_within_segment() {
        let path = sample_path();
        let pose = sword_pose_at(&path, 0.5, 10.0).expect("inside path");

        assert_eq!(pose.world, Vec2::new(5.0, 0.0));
        assert_eq!(pose.direction, Direction::Right);

        let turning = sword_pose_at(&path, 1.1, 10.0).expect("inside path");
        assert_eq!(turning.world, Vec2::new(10.0, 0.0));
        assert_eq!(turning.direction, Direction::Right);
    }

    #[test]
    fn pose_is_absent_outside_path_except_at_end() {
        let path = sample_path();

        assert_eq!(sword_pose_at(&path, -0.01, 10.0), None);
        assert_eq!(sword_pose_at(&path, 2.3, 10.0), None);
        assert_eq!(sword_pose_at(&[], 0.0, 10.0), None);

        let end = sword_pose_at(&path, 2.25, 10.0).expect("final node");
        assert_eq!(end.world, Vec2::new(10.0, 10.0));
        assert_eq!(end.direction, Direction::Down);
    }

    #[test]
    fn trail_skips_samples_before_start() {
        let path = sample_path();

        assert_eq!(sword_trail(&path, 0.0, 10.0).len(), 1);
        assert_eq!(sword_trail(&path, 2.0, 10.0).len(), TRAIL_SAMPLES);
        assert!(sword_trail(&path, 5.0, 10.0).is_empty());
    }

    #[test]
    fn combo_counts_hits_up_to_time() {
        let result = SimulationResult {
            hits: 2,
            path: sample_path(),
            shooter: Position::new(0, 0),
            direction: Direction::Right,
            target: Position::new(0, 2),
            obstacle: None,
        };

        assert_eq!(combo_at(&result, 0.5), 0);
        assert_eq!(combo_at(&result, 1.0), 1);
        assert_eq!(combo_at(&result, 1.25), 2);
        assert_eq!(combo_at(&result, 99.0), 2);
    }

    #[test]
    fn obstacle_state_tracks_activation() {
        let obstacle = Obstacle::delayed(Position::new(3, 3), 2.5);

        assert_eq!(
            obstacle_state_at(&obstacle, 2.0),
            ObstacleState::Pending { remaining: 0.5 }
        );
        assert_eq!(obstacle_state_at(&obstacle, 2.5), ObstacleState::Active);
        assert_eq!(
            obstacle_state_at(&Obstacle::fixed(Position::new(3, 3)), 0.0),
            ObstacleState::Active
        );
    }
}
