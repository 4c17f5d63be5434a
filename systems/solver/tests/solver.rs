use std::collections::HashSet;

use bladeline_core::{
    Candidate, Direction, Grid, Obstacle, ObstacleKind, PathAction, PathNode, Position,
    SimulationConfig, SimulationResult, Tile,
};
use bladeline_system_solver::{rank_candidates, select_targets, solve, EmptyReason, Solver};
use bladeline_system_trajectory::simulate;

fn boss_grid(boss: Position) -> Grid {
    Grid::default()
        .with_tile(boss, Tile::Boss)
        .expect("boss inside grid")
}

fn candidate(
    shooter: Position,
    direction: Direction,
    obstacle: Option<Obstacle>,
    hits: u32,
) -> Candidate {
    let result = SimulationResult {
        hits,
        path: vec![PathNode {
            position: shooter,
            direction,
            time: 0.0,
            hit: true,
            action: PathAction::Start,
        }],
        shooter,
        direction,
        target: Position::new(0, 0),
        obstacle,
    };
    Candidate::try_from(result).expect("candidate scored")
}

fn assert_sorted_by_hits(candidates: &[Candidate]) {
    assert!(
        candidates
            .windows(2)
            .all(|pair| pair[0].hits() >= pair[1].hits()),
        "candidates must be ordered by descending hits"
    );
}

#[test]
fn empty_map_has_nothing_to_search() {
    let grid = Grid::default();
    assert!(solve(&grid, &[], true).is_empty());

    let outcome = Solver::default().search(&grid, &[], true);
    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.summary.empty_reason, Some(EmptyReason::NoTarget));
    assert_eq!(outcome.summary.simulations, 0);
}

#[test]
fn boss_scenario_finds_adjacent_shooters() {
    let boss = Position::new(4, 10);
    let grid = boss_grid(boss);
    let candidates = solve(&grid, &[], false);

    assert!(!candidates.is_empty());
    assert_sorted_by_hits(&candidates);
    assert!(candidates.iter().all(|candidate| candidate.hits() > 0));
    assert!(candidates
        .iter()
        .all(|candidate| candidate.result().obstacle.is_none()));

    let adjacent = [
        Position::new(3, 10),
        Position::new(5, 10),
        Position::new(4, 9),
        Position::new(4, 11),
    ];
    assert!(candidates.iter().any(|candidate| {
        adjacent.contains(&candidate.result().shooter) && candidate.hits() >= 1
    }));
    assert!(candidates
        .iter()
        .all(|candidate| candidate.result().target == boss));
}

#[test]
fn summary_counts_every_shot() {
    let grid = boss_grid(Position::new(4, 10));
    let outcome = Solver::default().search(&grid, &[], false);

    let empty_tiles = 9 * 14 - 1;
    assert_eq!(outcome.summary.targets, 1);
    assert_eq!(outcome.summary.simulations, empty_tiles * 4);
    assert!(outcome.summary.raw_candidates >= outcome.candidates.len());
    assert_eq!(outcome.summary.empty_reason, None);
}

#[test]
fn unreachable_target_reports_no_hits() {
    let grid = Grid::new(3, 3)
        .and_then(|grid| grid.with_tile(Position::new(0, 1), Tile::Wall))
        .and_then(|grid| grid.with_tile(Position::new(1, 0), Tile::Wall))
        .and_then(|grid| grid.with_tile(Position::new(1, 1), Tile::Wall))
        .expect("valid grid");

    let outcome = Solver::default().search(&grid, &[Position::new(0, 0)], true);
    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.summary.empty_reason, Some(EmptyReason::NoHits));
    assert!(outcome.summary.simulations > 0);
}

#[test]
fn only_first_boss_is_targeted_without_path() {
    let grid = boss_grid(Position::new(2, 12))
        .with_tile(Position::new(6, 1), Tile::Boss)
        .expect("boss inside grid");

    assert_eq!(select_targets(&grid, &[]), vec![Position::new(2, 12)]);

    let path = [Position::new(8, 8), Position::new(0, 0)];
    assert_eq!(select_targets(&grid, &path), path.to_vec());
}

#[test]
fn duplicates_keep_highest_hit_count() {
    let shooter = Position::new(3, 3);
    let cell = Position::new(3, 7);
    let ranked = rank_candidates(vec![
        candidate(shooter, Direction::Right, Some(Obstacle::delayed(cell, 1.2)), 2),
        candidate(shooter, Direction::Right, Some(Obstacle::delayed(cell, 4.8)), 5),
        candidate(shooter, Direction::Right, Some(Obstacle::delayed(cell, 6.1)), 3),
    ]);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].hits(), 5);
    let obstacle = ranked[0].result().obstacle.expect("obstacle retained");
    assert!((obstacle.activation_time() - 4.8).abs() < f64::EPSILON);
}

#[test]
fn duplicate_ties_keep_first_encountered() {
    let shooter = Position::new(1, 1);
    let cell = Position::new(1, 5);
    let ranked = rank_candidates(vec![
        candidate(shooter, Direction::Down, Some(Obstacle::delayed(cell, 2.0)), 4),
        candidate(shooter, Direction::Down, Some(Obstacle::delayed(cell, 3.0)), 4),
    ]);

    assert_eq!(ranked.len(), 1);
    let obstacle = ranked[0].result().obstacle.expect("obstacle retained");
    assert!((obstacle.activation_time() - 2.0).abs() < f64::EPSILON);
}

#[test]
fn static_and_dynamic_obstacles_are_distinct_strategies() {
    let shooter = Position::new(1, 1);
    let cell = Position::new(1, 5);
    let ranked = rank_candidates(vec![
        candidate(shooter, Direction::Down, Some(Obstacle::fixed(cell)), 4),
        candidate(shooter, Direction::Down, Some(Obstacle::delayed(cell, 3.0)), 4),
        candidate(shooter, Direction::Down, None, 4),
    ]);

    assert_eq!(ranked.len(), 3);
    let kinds: Vec<_> = ranked
        .iter()
        .map(|candidate| candidate.result().obstacle.map(|obstacle| obstacle.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![None, Some(ObstacleKind::Static), Some(ObstacleKind::Dynamic)]
    );
}

#[test]
fn equal_hits_are_ordered_by_shooter_then_direction() {
    let ranked = rank_candidates(vec![
        candidate(Position::new(5, 0), Direction::Up, None, 3),
        candidate(Position::new(2, 7), Direction::Left, None, 3),
        candidate(Position::new(2, 7), Direction::Right, None, 3),
        candidate(Position::new(2, 1), Direction::Down, None, 3),
        candidate(Position::new(8, 8), Direction::Down, None, 9),
    ]);

    let order: Vec<_> = ranked
        .iter()
        .map(|candidate| (candidate.result().shooter, candidate.result().direction))
        .collect();
    assert_eq!(
        order,
        vec![
            (Position::new(8, 8), Direction::Down),
            (Position::new(2, 1), Direction::Down),
            (Position::new(2, 7), Direction::Right),
            (Position::new(2, 7), Direction::Left),
            (Position::new(5, 0), Direction::Up),
        ]
    );
}

#[test]
fn multiple_targets_merge_into_best_per_strategy() {
    let grid = Grid::default();
    let shooter = Position::new(4, 9);
    let path = [Position::new(4, 10), Position::new(0, 0)];

    let expected = path
        .iter()
        .map(|target| simulate(shooter, Direction::Right, &grid, *target, None).hits)
        .max()
        .expect("two targets");

    let candidates = solve(&grid, &path, false);
    let keys: HashSet<_> = candidates.iter().map(Candidate::key).collect();
    assert_eq!(keys.len(), candidates.len(), "keys must be unique");

    let retained = candidates
        .iter()
        .find(|candidate| {
            candidate.result().shooter == shooter
                && candidate.result().direction == Direction::Right
                && candidate.result().obstacle.is_none()
        })
        .expect("shooter next to the first target scores");
    assert_eq!(retained.hits(), expected);
    assert!(candidates
        .iter()
        .all(|candidate| candidate.result().shooter != candidate.result().target));
}

#[test]
fn auto_obstacles_respect_placement_rules() {
    let boss = Position::new(2, 5);
    let grid = Grid::new(5, 7)
        .and_then(|grid| grid.with_tile(boss, Tile::Boss))
        .and_then(|grid| grid.with_tile(Position::new(0, 2), Tile::Wall))
        .and_then(|grid| grid.with_tile(Position::new(4, 4), Tile::Forbidden))
        .expect("valid grid");

    let plain = solve(&grid, &[], false);
    let with_obstacles = solve(&grid, &[], true);

    assert_sorted_by_hits(&with_obstacles);
    assert!(with_obstacles.len() > plain.len());
    assert!(with_obstacles[0].hits() >= plain[0].hits());

    let keys: HashSet<_> = with_obstacles.iter().map(Candidate::key).collect();
    assert_eq!(keys.len(), with_obstacles.len());

    for candidate in &with_obstacles {
        let result = candidate.result();
        assert_eq!(result.hits as usize, result.hit_nodes().count());
        let Some(obstacle) = result.obstacle else {
            continue;
        };
        assert_ne!(obstacle.position(), result.shooter);
        assert_ne!(obstacle.position(), result.target);
        assert!(grid.is_empty_tile(obstacle.position()));
        if obstacle.kind() == ObstacleKind::Dynamic {
            assert!(obstacle.activation_time() >= SimulationConfig::default().obstacle_drop_delay);
        }
    }
}

#[test]
fn dynamic_obstacle_drops_after_first_visit() {
    let grid = boss_grid(Position::new(4, 10));
    let config = SimulationConfig::default();
    let candidates = Solver::new(config.clone()).solve(&grid, &[], true);

    let dynamic = candidates
        .iter()
        .find(|candidate| {
            candidate
                .result()
                .obstacle
                .is_some_and(|obstacle| obstacle.kind() == ObstacleKind::Dynamic)
        })
        .expect("at least one dynamic obstacle candidate");
    let result = dynamic.result();
    let obstacle = result.obstacle.expect("dynamic obstacle");

    let base = simulate(result.shooter, result.direction, &grid, result.target, None);
    let first_visit = base
        .path
        .iter()
        .find(|node| node.position == obstacle.position())
        .map(|node| node.time)
        .expect("obstacle lies on the unobstructed path");
    assert!(
        (obstacle.activation_time() - (first_visit + config.obstacle_drop_delay)).abs() < 1e-9
    );
}
