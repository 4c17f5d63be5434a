use std::fmt::Write as _;

use bladeline_core::{Candidate, ObstacleKind};
use bladeline_system_solver::{EmptyReason, SearchOutcome};
use serde::Serialize;

/// Guidance printed when the map offers nothing to aim at.
pub(crate) const NO_TARGET_GUIDANCE: &str =
    "nothing to aim at: draw an enemy path or place a boss tile on the map";

/// Machine-readable rendition of a search outcome.
#[derive(Debug, Serialize)]
pub(crate) struct JsonReport<'a> {
    targets: usize,
    simulations: usize,
    raw_candidates: usize,
    unique_candidates: usize,
    empty_reason: Option<&'static str>,
    candidates: &'a [Candidate],
}

impl<'a> JsonReport<'a> {
    /// Captures the summary and the `top` best candidates.
    #[must_use]
    pub(crate) fn new(outcome: &'a SearchOutcome, top: usize) -> Self {
        let summary = outcome.summary;
        Self {
            targets: summary.targets,
            simulations: summary.simulations,
            raw_candidates: summary.raw_candidates,
            unique_candidates: outcome.candidates.len(),
            empty_reason: summary.empty_reason.map(reason_label),
            candidates: best(outcome, top),
        }
    }
}

/// Renders the search outcome as human-readable text.
#[must_use]
pub(crate) fn render_text(outcome: &SearchOutcome, top: usize) -> String {
    let summary = outcome.summary;
    let mut text = String::new();

    match summary.empty_reason {
        Some(EmptyReason::NoTarget) => {
            let _ = writeln!(text, "{NO_TARGET_GUIDANCE}");
            return text;
        }
        Some(EmptyReason::NoHits) => {
            let _ = writeln!(
                text,
                "searched {} target(s) with {} simulation(s); no shot scores a hit",
                summary.targets, summary.simulations
            );
            return text;
        }
        None => {}
    }

    let _ = writeln!(
        text,
        "searched {} target(s) with {} simulation(s): {} scoring, {} unique",
        summary.targets,
        summary.simulations,
        summary.raw_candidates,
        outcome.candidates.len()
    );

    for (rank, candidate) in best(outcome, top).iter().enumerate() {
        let result = candidate.result();
        let _ = write!(
            text,
            "#{:<3} {:>3} hit(s)  fire {} from {}",
            rank + 1,
            candidate.hits(),
            result.direction,
            result.shooter
        );
        if let Some(obstacle) = result.obstacle {
            let _ = match obstacle.kind() {
                ObstacleKind::Static => write!(text, ", wall at {}", obstacle.position()),
                ObstacleKind::Dynamic => write!(
                    text,
                    ", drop wall at {} after {:.2}s",
                    obstacle.position(),
                    obstacle.activation_time()
                ),
            };
        }
        let _ = writeln!(text, "  (target {})", result.target);
    }

    text
}

fn best(outcome: &SearchOutcome, top: usize) -> &[Candidate] {
    &outcome.candidates[..top.min(outcome.candidates.len())]
}

fn reason_label(reason: EmptyReason) -> &'static str {
    match reason {
        EmptyReason::NoTarget => "no_target",
        EmptyReason::NoHits => "no_hits",
    }
}
