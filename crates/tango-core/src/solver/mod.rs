//! Solver core.
//!
//! Wraps the backtracking search with the operations callers need: plain
//! solving, solution counting, the blocking-assignment uniqueness check,
//! hints, and the combined solve report with explanation steps.

mod search;
mod types;

use crate::explain::{self, Explanation};
use crate::{EngineError, Grid, Link, Rules, DEFAULT_SIZE};
use log::{debug, trace};
use search::Budget;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use types::{CheckReport, Difficulty, Hint, Rule, SolveReport};

/// Shared flag a caller flips to abort a running search or generation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Abort a single call after this long
    pub timeout: Option<Duration>,
    /// Abort when this token is cancelled
    pub cancel: Option<CancellationToken>,
    /// Node expansions between cancellation/deadline polls
    pub check_interval: u64,
    /// Board dimension every input grid must have
    pub expected_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            cancel: None,
            check_interval: 1024,
            expected_size: DEFAULT_SIZE,
        }
    }
}

impl SolverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_expected_size(mut self, size: usize) -> Self {
        self.expected_size = size;
        self
    }
}

/// Outcome of a search. Unsatisfiable is an ordinary answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Satisfiable(Grid),
    Unsatisfiable,
}

impl SolveOutcome {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SolveOutcome::Satisfiable(_))
    }

    pub fn grid(&self) -> Option<&Grid> {
        match self {
            SolveOutcome::Satisfiable(grid) => Some(grid),
            SolveOutcome::Unsatisfiable => None,
        }
    }

    pub fn into_grid(self) -> Option<Grid> {
        match self {
            SolveOutcome::Satisfiable(grid) => Some(grid),
            SolveOutcome::Unsatisfiable => None,
        }
    }
}

/// Stateless solver; all search state is per call.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    /// Create a solver with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver with custom configuration
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Find any completion of `grid` honouring the rules and links.
    pub fn solve(&self, grid: &Grid, links: &[Link]) -> Result<SolveOutcome, EngineError> {
        let rules = self.rules(grid, links)?;
        let mut budget = Budget::new(&self.config);
        self.search(&rules, grid, None, &mut budget)
    }

    /// Find a completion that differs from `other` in at least one cell.
    pub fn solve_excluding(
        &self,
        grid: &Grid,
        links: &[Link],
        other: &Grid,
    ) -> Result<SolveOutcome, EngineError> {
        if other.size() != grid.size() {
            return Err(EngineError::InvalidDimensions {
                expected: grid.size(),
                found: format!("excluded grid is {}x{}", other.size(), other.size()),
            });
        }
        let rules = self.rules(grid, links)?;
        let mut budget = Budget::new(&self.config);
        self.search(&rules, grid, Some(other), &mut budget)
    }

    /// Count solutions up to a limit.
    pub fn count_solutions(
        &self,
        grid: &Grid,
        links: &[Link],
        limit: usize,
    ) -> Result<usize, EngineError> {
        let rules = self.rules(grid, links)?;
        if !rules.is_consistent(grid) {
            return Ok(0);
        }
        let mut budget = Budget::new(&self.config);
        let mut working = grid.clone();
        search::count_solutions(&rules, working.cells_mut(), limit, &mut budget)
    }

    /// Check if the puzzle has exactly one solution.
    ///
    /// Solves once, then searches again with the first solution blocked.
    /// An unsatisfiable puzzle is not unique.
    pub fn is_unique(&self, grid: &Grid, links: &[Link]) -> Result<bool, EngineError> {
        let rules = self.rules(grid, links)?;
        let mut budget = Budget::new(&self.config);
        match self.search(&rules, grid, None, &mut budget)? {
            SolveOutcome::Satisfiable(first) => self.is_only(&rules, grid, &first, &mut budget),
            SolveOutcome::Unsatisfiable => Ok(false),
        }
    }

    /// Whether the grid can be completed, and whether that completion is unique.
    pub fn check(&self, grid: &Grid, links: &[Link]) -> Result<CheckReport, EngineError> {
        let rules = self.rules(grid, links)?;
        let mut budget = Budget::new(&self.config);
        Ok(match self.search(&rules, grid, None, &mut budget)? {
            SolveOutcome::Satisfiable(first) => CheckReport {
                solvable: true,
                unique: self.is_only(&rules, grid, &first, &mut budget)?,
            },
            SolveOutcome::Unsatisfiable => CheckReport {
                solvable: false,
                unique: false,
            },
        })
    }

    /// Solve and narrate: the solution, its deduction steps and uniqueness.
    pub fn solve_report(&self, grid: &Grid, links: &[Link]) -> Result<SolveReport, EngineError> {
        let rules = self.rules(grid, links)?;
        let mut budget = Budget::new(&self.config);
        let solution = match self.search(&rules, grid, None, &mut budget)? {
            SolveOutcome::Satisfiable(solution) => solution,
            SolveOutcome::Unsatisfiable => {
                return Ok(SolveReport {
                    success: false,
                    solution: None,
                    steps: Vec::new(),
                    unique: false,
                })
            }
        };

        let steps = explain::deduce_steps(&rules, grid, &solution);
        let unique = self.is_only(&rules, grid, &solution, &mut budget)?;
        Ok(SolveReport {
            success: true,
            solution: Some(solution),
            steps,
            unique,
        })
    }

    /// Detailed step narration plus summary, or `None` when unsolvable.
    pub fn explain(&self, grid: &Grid, links: &[Link]) -> Result<Option<Explanation>, EngineError> {
        let rules = self.rules(grid, links)?;
        let mut budget = Budget::new(&self.config);
        Ok(match self.search(&rules, grid, None, &mut budget)? {
            SolveOutcome::Satisfiable(solution) => {
                let steps = explain::deduce_steps(&rules, grid, &solution);
                Some(Explanation::from_steps(&steps, grid.size()))
            }
            SolveOutcome::Unsatisfiable => None,
        })
    }

    /// Get a hint for the current position.
    ///
    /// The first deduction step from the current grid, valued from the
    /// solution. `None` when the grid is full or cannot be completed.
    pub fn hint(&self, grid: &Grid, links: &[Link]) -> Result<Option<Hint>, EngineError> {
        let rules = self.rules(grid, links)?;
        if grid.is_complete() {
            return Ok(None);
        }
        let mut budget = Budget::new(&self.config);
        let solution = match self.search(&rules, grid, None, &mut budget)? {
            SolveOutcome::Satisfiable(solution) => solution,
            SolveOutcome::Unsatisfiable => {
                debug!("no hint: grid cannot be completed");
                return Ok(None);
            }
        };

        let hint = explain::deduce_steps(&rules, grid, &solution)
            .into_iter()
            .find(|step| grid.is_empty_at(step.position()))
            .and_then(|step| {
                let value = solution.get(step.position())?;
                Some(Hint {
                    row: step.row,
                    col: step.col,
                    value,
                    explanation: step.explanation,
                    rule: step.rule,
                })
            });
        Ok(hint)
    }

    /// Compile the rules for `grid`, rejecting boards of the wrong dimension.
    fn rules(&self, grid: &Grid, links: &[Link]) -> Result<Rules, EngineError> {
        let expected = self.config.expected_size;
        if grid.size() != expected {
            return Err(EngineError::InvalidDimensions {
                expected,
                found: format!("got {}x{}", grid.size(), grid.size()),
            });
        }
        Rules::for_grid(grid, links)
    }

    fn search(
        &self,
        rules: &Rules,
        grid: &Grid,
        exclude: Option<&Grid>,
        budget: &mut Budget,
    ) -> Result<SolveOutcome, EngineError> {
        budget.poll()?;
        if !rules.is_consistent(grid) {
            return Ok(SolveOutcome::Unsatisfiable);
        }

        let mut working = grid.clone();
        let result = search::find_solution(
            rules,
            working.cells_mut(),
            exclude.map(Grid::cells),
            budget,
        );
        match result {
            Ok(true) => {
                trace!("search found a solution after {} nodes", budget.nodes());
                Ok(SolveOutcome::Satisfiable(working))
            }
            Ok(false) => {
                trace!("search exhausted after {} nodes", budget.nodes());
                Ok(SolveOutcome::Unsatisfiable)
            }
            Err(e) => {
                debug!("search aborted after {} nodes: {}", budget.nodes(), e);
                Err(e)
            }
        }
    }

    fn is_only(
        &self,
        rules: &Rules,
        grid: &Grid,
        solution: &Grid,
        budget: &mut Budget,
    ) -> Result<bool, EngineError> {
        Ok(!self.search(rules, grid, Some(solution), budget)?.is_satisfiable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Symbol};

    const SOLVED: &str = "ABABAB BABABA ABABAB BABABA ABABAB BABABA";

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_solve_empty_grid() {
        let solver = Solver::new();
        let outcome = solver.solve(&Grid::empty(), &[]).unwrap();
        let solution = outcome.grid().unwrap();
        assert!(solution.is_complete());
        assert!(Rules::new(6, &[]).unwrap().is_solution(solution));
    }

    #[test]
    fn test_empty_grid_not_unique() {
        let solver = Solver::new();
        assert!(!solver.is_unique(&Grid::empty(), &[]).unwrap());
        assert_eq!(solver.count_solutions(&Grid::empty(), &[], 2).unwrap(), 2);
    }

    #[test]
    fn test_givens_are_kept() {
        let grid = Grid::from_string("A..... .B.... ...... ...... ...... .....A").unwrap();
        let solution = Solver::new().solve(&grid, &[]).unwrap().into_grid().unwrap();
        assert!(grid.is_subset_of(&solution));
    }

    #[test]
    fn test_links_are_honoured() {
        let links = vec![
            Link::equal(pos(0, 0), pos(0, 1)),
            Link::opposite(pos(2, 3), pos(3, 3)),
            Link::opposite(pos(0, 0), pos(5, 5)),
        ];
        let grid = Grid::from_string("A..... ...... ...... ...... ...... ......").unwrap();
        let solution = Solver::new().solve(&grid, &links).unwrap().into_grid().unwrap();
        assert_eq!(solution.get(pos(0, 1)), Some(Symbol::Sun));
        assert_ne!(solution.get(pos(2, 3)), solution.get(pos(3, 3)));
        assert_eq!(solution.get(pos(5, 5)), Some(Symbol::Moon));
    }

    #[test]
    fn test_contradictory_givens_unsatisfiable() {
        let grid = Grid::from_string("AAA... ...... ...... ...... ...... ......").unwrap();
        let solver = Solver::new();
        assert_eq!(solver.solve(&grid, &[]).unwrap(), SolveOutcome::Unsatisfiable);
        assert!(!solver.is_unique(&grid, &[]).unwrap());
        assert_eq!(
            solver.check(&grid, &[]).unwrap(),
            CheckReport {
                solvable: false,
                unique: false
            }
        );
    }

    #[test]
    fn test_contradictory_links_unsatisfiable() {
        let links = vec![
            Link::equal(pos(0, 0), pos(0, 1)),
            Link::equal(pos(0, 1), pos(0, 2)),
            Link::equal(pos(0, 0), pos(0, 2)),
        ];
        let outcome = Solver::new().solve(&Grid::empty(), &links).unwrap();
        assert!(!outcome.is_satisfiable());
    }

    #[test]
    fn test_complete_grid_is_unique() {
        let grid = Grid::from_string(SOLVED).unwrap();
        let solver = Solver::new();
        assert!(solver.is_unique(&grid, &[]).unwrap());
        assert!(!solver.solve_excluding(&grid, &[], &grid).unwrap().is_satisfiable());
    }

    #[test]
    fn test_solve_excluding_finds_other() {
        let solver = Solver::new();
        let first = solver.solve(&Grid::empty(), &[]).unwrap().into_grid().unwrap();
        let second = solver
            .solve_excluding(&Grid::empty(), &[], &first)
            .unwrap()
            .into_grid()
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_link_rejected() {
        let links = vec![Link::equal(pos(0, 0), pos(0, 0))];
        let err = Solver::new().solve(&Grid::empty(), &links).unwrap_err();
        assert!(matches!(err, EngineError::MalformedConstraint { .. }));
    }

    #[test]
    fn test_hint_on_complete_grid_is_none() {
        let grid = Grid::from_string(SOLVED).unwrap();
        assert_eq!(Solver::new().hint(&grid, &[]).unwrap(), None);
    }

    #[test]
    fn test_hint_on_unsolvable_grid_is_none() {
        let grid = Grid::from_string("AAA... ...... ...... ...... ...... ......").unwrap();
        assert_eq!(Solver::new().hint(&grid, &[]).unwrap(), None);
    }

    #[test]
    fn test_hint_targets_empty_cell() {
        let mut grid = Grid::from_string(SOLVED).unwrap();
        grid.set(pos(2, 4), None);
        let hint = Solver::new().hint(&grid, &[]).unwrap().unwrap();
        assert_eq!(hint.position(), pos(2, 4));
        assert_eq!(hint.value, Symbol::Sun);
        assert_eq!(hint.rule, Rule::RowCount);
    }

    #[test]
    fn test_solve_report() {
        let mut grid = Grid::from_string(SOLVED).unwrap();
        grid.set(pos(0, 0), None);
        grid.set(pos(5, 5), None);
        let report = Solver::new().solve_report(&grid, &[]).unwrap();
        assert!(report.success);
        assert!(report.unique);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.solution, Some(Grid::from_string(SOLVED).unwrap()));
    }

    #[test]
    fn test_cancelled_search() {
        let token = CancellationToken::new();
        token.cancel();
        let solver = Solver::with_config(SolverConfig::default().with_cancellation(token));
        assert_eq!(
            solver.solve(&Grid::empty(), &[]).unwrap_err(),
            EngineError::Cancelled
        );
    }

    #[test]
    fn test_zero_timeout_reported_distinctly() {
        let solver = Solver::with_config(SolverConfig::default().with_timeout(Duration::ZERO));
        let err = solver.is_unique(&Grid::empty(), &[]).unwrap_err();
        assert_eq!(err, EngineError::Timeout);
        assert!(err.is_aborted());
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let solver = Solver::new();
        for size in [2, 8] {
            let grid = Grid::new(size).unwrap();
            let expected = EngineError::InvalidDimensions {
                expected: 6,
                found: format!("got {}x{}", size, size),
            };
            assert_eq!(solver.solve(&grid, &[]).unwrap_err(), expected);
            assert_eq!(solver.check(&grid, &[]).unwrap_err(), expected);
            assert_eq!(solver.hint(&grid, &[]).unwrap_err(), expected);
            assert_eq!(solver.count_solutions(&grid, &[], 2).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_expected_size_configurable() {
        let solver = Solver::with_config(SolverConfig::default().with_expected_size(8));
        let solved = solver.solve(&Grid::new(8).unwrap(), &[]).unwrap();
        assert!(solved.grid().unwrap().is_complete());
        assert!(solver.solve(&Grid::empty(), &[]).is_err());
    }
}
