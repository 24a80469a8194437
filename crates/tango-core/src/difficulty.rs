//! Difficulty scoring from the deduction path a puzzle needs.

use crate::explain::{rule_counts, ExplanationStep};
use crate::{Difficulty, EngineError, Grid, Link, Rule, Solver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_steps: usize,
    /// Steps per rule; every rule is listed, unused ones with zero.
    pub deduction_counts: BTreeMap<Rule, usize>,
    /// 0 to 100, higher is harder
    pub difficulty_score: f64,
    pub given_cells: usize,
    pub constraint_count: usize,
}

/// Output of the `analyze` operation.
///
/// `difficulty` and `metrics` are absent when the puzzle cannot be solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyReport {
    pub difficulty: Option<Difficulty>,
    pub solvable: bool,
    pub unique: bool,
    pub metrics: Option<Metrics>,
}

impl DifficultyReport {
    fn unsolvable() -> Self {
        Self {
            difficulty: None,
            solvable: false,
            unique: false,
            metrics: None,
        }
    }

    /// Advisory tweaks for puzzles sitting at the edge of their level.
    pub fn suggest_adjustments(&self) -> Vec<String> {
        let (Some(difficulty), Some(metrics)) = (self.difficulty, self.metrics.as_ref()) else {
            return Vec::new();
        };

        let mut suggestions = Vec::new();
        match difficulty {
            Difficulty::Easy => {
                if metrics.given_cells < 20 {
                    suggestions.push("Add more given cells to make it easier".to_string());
                }
                if metrics.constraint_count < 3 {
                    suggestions.push("Add more constraints to provide more clues".to_string());
                }
            }
            Difficulty::Hard => {
                if metrics.given_cells > 14 {
                    suggestions.push("Remove some given cells to make it harder".to_string());
                }
                let advanced = metrics
                    .deduction_counts
                    .get(&Rule::AdvancedDeduction)
                    .copied()
                    .unwrap_or(0);
                if advanced < 2 {
                    suggestions.push("Adjust puzzle to require more complex deductions".to_string());
                }
            }
            Difficulty::Medium => {}
        }
        suggestions
    }
}

/// Weighted score of a deduction path.
///
/// Longer paths scale the average weight up, capped at twice its value
/// from twenty steps on.
pub fn score(steps: &[ExplanationStep]) -> f64 {
    let total = steps.len();
    let weighted: f64 = rule_counts(steps)
        .iter()
        .map(|(rule, &count)| count as f64 * rule.weight())
        .sum();
    let step_factor = (total as f64 / 20.0).min(2.0);
    (weighted * step_factor * 10.0 / total.max(1) as f64).min(100.0)
}

/// Rates puzzles by solving them and scoring the explanation.
#[derive(Debug, Clone, Default)]
pub struct DifficultyAnalyzer {
    solver: Solver,
}

impl DifficultyAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(solver: Solver) -> Self {
        Self { solver }
    }

    pub fn analyze(&self, grid: &Grid, links: &[Link]) -> Result<DifficultyReport, EngineError> {
        let report = self.solver.solve_report(grid, links)?;
        if !report.success {
            return Ok(DifficultyReport::unsolvable());
        }

        let difficulty_score = score(&report.steps);
        Ok(DifficultyReport {
            difficulty: Some(Difficulty::from_score(difficulty_score)),
            solvable: true,
            unique: report.unique,
            metrics: Some(Metrics {
                total_steps: report.steps.len(),
                deduction_counts: rule_counts(&report.steps),
                difficulty_score,
                given_cells: grid.filled_count(),
                constraint_count: links.len(),
            }),
        })
    }
}
