//! Depth-first search with forward checking.
//!
//! Every empty cell is scored by how many symbols the rules still allow
//! there. A cell with no option is a dead end, a cell with one option is
//! branched on immediately, and otherwise the cell with the most filled
//! neighbours is tried. Because each placement is checked against counts,
//! runs and links, any complete assignment reached is a valid solution.

use super::{CancellationToken, SolverConfig};
use crate::{EngineError, Rules, Symbol};
use std::time::{Duration, Instant};

/// Node counter that polls cancellation and the deadline at a fixed interval.
pub(crate) struct Budget {
    started: Instant,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
    interval: u64,
    nodes: u64,
}

impl Budget {
    pub(crate) fn new(config: &SolverConfig) -> Self {
        Self {
            started: Instant::now(),
            timeout: config.timeout,
            cancel: config.cancel.clone(),
            interval: config.check_interval.max(1),
            nodes: 0,
        }
    }

    pub(crate) fn nodes(&self) -> u64 {
        self.nodes
    }

    fn tick(&mut self) -> Result<(), EngineError> {
        self.nodes += 1;
        if self.nodes == 1 || self.nodes % self.interval == 0 {
            self.poll()?;
        }
        Ok(())
    }

    pub(crate) fn poll(&self) -> Result<(), EngineError> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(EngineError::Cancelled);
        }
        if self.timeout.is_some_and(|t| self.started.elapsed() >= t) {
            return Err(EngineError::Timeout);
        }
        Ok(())
    }
}

enum Choice {
    Complete,
    DeadEnd,
    Branch(usize, Vec<Symbol>),
}

struct Search<'a> {
    rules: &'a Rules,
    budget: &'a mut Budget,
}

impl Search<'_> {
    /// Returns `Ok(true)` once `visit` asks to stop; the cells then hold the
    /// assignment that stopped it.
    fn descend(
        &mut self,
        cells: &mut [Option<Symbol>],
        visit: &mut dyn FnMut(&[Option<Symbol>]) -> bool,
    ) -> Result<bool, EngineError> {
        self.budget.tick()?;

        let (idx, options) = match self.choose(cells) {
            Choice::Complete => return Ok(visit(cells)),
            Choice::DeadEnd => return Ok(false),
            Choice::Branch(idx, options) => (idx, options),
        };

        for symbol in options {
            cells[idx] = Some(symbol);
            if self.descend(cells, visit)? {
                return Ok(true);
            }
        }
        cells[idx] = None;
        Ok(false)
    }

    fn choose(&self, cells: &[Option<Symbol>]) -> Choice {
        let mut best: Option<(usize, usize)> = None;

        for idx in 0..cells.len() {
            if cells[idx].is_some() {
                continue;
            }
            let options: Vec<Symbol> = Symbol::ALL
                .into_iter()
                .filter(|&s| self.rules.allows_index(cells, idx, s))
                .collect();
            match options.len() {
                0 => return Choice::DeadEnd,
                1 => return Choice::Branch(idx, options),
                _ => {
                    let fixed = self.rules.fixed_neighbours(cells, idx);
                    if best.map_or(true, |(_, most)| fixed > most) {
                        best = Some((idx, fixed));
                    }
                }
            }
        }

        match best {
            Some((idx, _)) => Choice::Branch(idx, Symbol::ALL.to_vec()),
            None => Choice::Complete,
        }
    }
}

/// Fill `cells` with a solution, skipping the assignment equal to `exclude`.
pub(crate) fn find_solution(
    rules: &Rules,
    cells: &mut [Option<Symbol>],
    exclude: Option<&[Option<Symbol>]>,
    budget: &mut Budget,
) -> Result<bool, EngineError> {
    let mut search = Search { rules, budget };
    let mut visit = |solution: &[Option<Symbol>]| exclude.map_or(true, |other| solution != other);
    search.descend(cells, &mut visit)
}

/// Count solutions, stopping once `limit` is reached.
pub(crate) fn count_solutions(
    rules: &Rules,
    cells: &mut [Option<Symbol>],
    limit: usize,
    budget: &mut Budget,
) -> Result<usize, EngineError> {
    let mut count = 0;
    if limit == 0 {
        return Ok(0);
    }
    let mut search = Search { rules, budget };
    let mut visit = |_: &[Option<Symbol>]| {
        count += 1;
        count >= limit
    };
    search.descend(cells, &mut visit)?;
    Ok(count)
}
