#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Exhaustive search for the firing solution that scores the most hits.
//!
//! The solver enumerates every empty shooter tile and facing against each
//! target, optionally retries every shot with a single static or dynamic
//! obstacle dropped on a tile the unobstructed sword visited, and ranks the
//! scoring results after collapsing duplicates that share a
//! [`CandidateKey`].

use std::collections::{btree_map::Entry, BTreeMap, HashSet};

use bladeline_core::{
    Candidate, CandidateKey, Direction, Grid, Obstacle, Position, SimulationConfig,
    SimulationResult,
};
use bladeline_system_trajectory::Trajectory;
use log::{debug, info};

/// Candidate solver that reuses scratch buffers between searches.
#[derive(Debug, Default)]
pub struct Solver {
    trajectory: Trajectory,
    visited: HashSet<Position>,
    placements: Vec<Placement>,
}

impl Solver {
    /// Creates a solver using the provided simulation configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            trajectory: Trajectory::new(config),
            ..Self::default()
        }
    }

    /// Configuration shared by every simulated shot.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        self.trajectory.config()
    }

    /// Searches the grid and returns the ranked candidates.
    pub fn solve(
        &mut self,
        grid: &Grid,
        enemy_path: &[Position],
        auto_obstacle: bool,
    ) -> Vec<Candidate> {
        self.search(grid, enemy_path, auto_obstacle).candidates
    }

    /// Searches the grid and reports the ranked candidates with search statistics.
    ///
    /// # Panics
    ///
    /// Panics when an enemy path position lies outside the grid.
    pub fn search(
        &mut self,
        grid: &Grid,
        enemy_path: &[Position],
        auto_obstacle: bool,
    ) -> SearchOutcome {
        let targets = select_targets(grid, enemy_path);
        if targets.is_empty() {
            info!("no enemy path or boss tile; nothing to search");
            return SearchOutcome {
                candidates: Vec::new(),
                summary: SearchSummary {
                    empty_reason: Some(EmptyReason::NoTarget),
                    ..SearchSummary::default()
                },
            };
        }

        info!(
            "searching {} target(s) on a {}x{} grid (auto obstacle: {auto_obstacle})",
            targets.len(),
            grid.rows(),
            grid.columns()
        );

        let mut raw = Vec::new();
        let mut simulations = 0;
        for target in &targets {
            let before = raw.len();
            simulations += self.search_target(grid, *target, auto_obstacle, &mut raw);
            debug!(
                "target {target}: {} scoring shot(s)",
                raw.len() - before
            );
        }

        let raw_candidates = raw.len();
        let candidates = rank_candidates(raw);
        let empty_reason = candidates.is_empty().then_some(EmptyReason::NoHits);

        info!(
            "search finished: {simulations} simulation(s), {raw_candidates} scoring, {} unique",
            candidates.len()
        );
        if let Some(best) = candidates.first() {
            info!("best: {} with {} hit(s)", best.key(), best.hits());
        }

        SearchOutcome {
            candidates,
            summary: SearchSummary {
                targets: targets.len(),
                simulations,
                raw_candidates,
                empty_reason,
            },
        }
    }

    /// Enumerates every shot against a single target, appending scoring results to `out`.
    ///
    /// Results are neither deduplicated nor ranked, so per-target batches may be
    /// merged and passed to [`rank_candidates`]. Returns the number of
    /// simulations run.
    ///
    /// # Panics
    ///
    /// Panics when the target lies outside the grid.
    pub fn search_target(
        &mut self,
        grid: &Grid,
        target: Position,
        auto_obstacle: bool,
        out: &mut Vec<Candidate>,
    ) -> usize {
        assert!(
            grid.contains(target),
            "target {target} lies outside the {}x{} grid",
            grid.rows(),
            grid.columns()
        );

        let mut simulations = 0;
        let shooters: Vec<_> = grid
            .positions()
            .filter(|position| *position != target && grid.is_empty_tile(*position))
            .collect();

        for shooter in shooters {
            for direction in Direction::ALL {
                let base = self
                    .trajectory
                    .simulate(shooter, direction, grid, target, None);
                simulations += 1;

                if auto_obstacle && !base.path.is_empty() {
                    self.collect_placements(grid, &base);
                    for placement in &self.placements {
                        let delay = self.config().obstacle_drop_delay;
                        let fixed = Obstacle::fixed(placement.position);
                        let dropped =
                            Obstacle::delayed(placement.position, placement.first_visit + delay);

                        for obstacle in [fixed, dropped] {
                            let result = self.trajectory.simulate(
                                shooter,
                                direction,
                                grid,
                                target,
                                Some(obstacle),
                            );
                            simulations += 1;
                            retain(result, out);
                        }
                    }
                }

                retain(base, out);
            }
        }

        simulations
    }

    fn collect_placements(&mut self, grid: &Grid, base: &SimulationResult) {
        self.visited.clear();
        self.placements.clear();

        for node in &base.path {
            if !self.visited.insert(node.position) {
                continue;
            }
            if node.position == base.target
                || node.position == base.shooter
                || !grid.is_empty_tile(node.position)
            {
                continue;
            }

            self.placements.push(Placement {
                position: node.position,
                first_visit: node.time,
            });
        }
    }
}

/// Searches the grid with the default configuration.
#[must_use]
pub fn solve(grid: &Grid, enemy_path: &[Position], auto_obstacle: bool) -> Vec<Candidate> {
    Solver::default().solve(grid, enemy_path, auto_obstacle)
}

/// Resolves the targets a search runs against.
///
/// Every enemy path position is its own target. Without a path, the first
/// boss tile in row-major order is the only target.
#[must_use]
pub fn select_targets(grid: &Grid, enemy_path: &[Position]) -> Vec<Position> {
    if !enemy_path.is_empty() {
        return enemy_path.to_vec();
    }

    grid.first_boss().into_iter().collect()
}

/// Collapses candidates sharing a [`CandidateKey`] and sorts by descending hits.
///
/// Among duplicates the first candidate with the strictly greatest hit count
/// wins. Candidates with equal hits are ordered by ascending key.
#[must_use]
pub fn rank_candidates<I>(raw: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut best: BTreeMap<CandidateKey, Candidate> = BTreeMap::new();
    for candidate in raw {
        match best.entry(candidate.key()) {
            Entry::Vacant(slot) => {
                let _ = slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                if candidate.hits() > slot.get().hits() {
                    let _ = slot.insert(candidate);
                }
            }
        }
    }

    let mut ranked: Vec<_> = best.into_values().collect();
    ranked.sort_by(|left, right| right.hits().cmp(&left.hits()));
    ranked
}

/// Ranked candidates together with statistics about the search that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Deduplicated candidates ordered by descending hits.
    pub candidates: Vec<Candidate>,
    /// Statistics describing the search.
    pub summary: SearchSummary,
}

/// Statistics describing a completed search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Number of targets searched.
    pub targets: usize,
    /// Number of shots simulated.
    pub simulations: usize,
    /// Number of scoring shots before deduplication.
    pub raw_candidates: usize,
    /// Why the search produced no candidates, if it produced none.
    pub empty_reason: Option<EmptyReason>,
}

/// Reasons a search can end without candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmptyReason {
    /// Neither an enemy path nor a boss tile exists.
    NoTarget,
    /// Targets existed but no shot scored a hit.
    NoHits,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    position: Position,
    first_visit: f64,
}

fn retain(result: SimulationResult, out: &mut Vec<Candidate>) {
    if let Ok(candidate) = Candidate::try_from(result) {
        out.push(candidate);
    }
}
