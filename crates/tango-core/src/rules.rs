//! The board rules as a compiled, declarative model.
//!
//! A [`Rules`] value captures everything the puzzle demands of a grid of a
//! given size: one symbol per cell, balanced rows and columns, no run of three
//! and the link constraints. The search engine and the explanation engine both
//! query it cell by cell; the validator re-derives the same rules over whole
//! lines so the two always agree on what a legal board is.

use crate::{EngineError, Grid, Link, LinkKind, Position, Symbol};

/// Rule set for one board size and link list.
#[derive(Debug, Clone)]
pub struct Rules {
    size: usize,
    links: Vec<Link>,
    /// For each cell index, the linked partner cells and the link kind.
    partners: Vec<Vec<(usize, LinkKind)>>,
}

impl Rules {
    /// Compile the rules, rejecting malformed links before any search starts.
    pub fn new(size: usize, links: &[Link]) -> Result<Self, EngineError> {
        if size == 0 || size % 2 != 0 {
            return Err(EngineError::InvalidSize(size));
        }

        let mut partners = vec![Vec::new(); size * size];
        for (index, link) in links.iter().enumerate() {
            let (a, b) = (link.first(), link.second());
            for pos in [a, b] {
                if pos.row >= size || pos.col >= size {
                    return Err(EngineError::MalformedConstraint {
                        index,
                        reason: format!("cell {} is outside the {}x{} board", pos, size, size),
                    });
                }
            }
            if a == b {
                return Err(EngineError::MalformedConstraint {
                    index,
                    reason: format!("cell {} is linked to itself", a),
                });
            }
            let (ia, ib) = (a.row * size + a.col, b.row * size + b.col);
            partners[ia].push((ib, link.kind));
            partners[ib].push((ia, link.kind));
        }

        Ok(Self {
            size,
            links: links.to_vec(),
            partners,
        })
    }

    /// Rules sized to match `grid`.
    pub fn for_grid(grid: &Grid, links: &[Link]) -> Result<Self, EngineError> {
        Self::new(grid.size(), links)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn half(&self) -> usize {
        self.size / 2
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Whether the cell takes part in any link.
    pub fn is_linked(&self, pos: Position) -> bool {
        !self.partners[pos.row * self.size + pos.col].is_empty()
    }

    /// Whether `symbol` may sit at `pos` given the other filled cells.
    ///
    /// The current content of `pos` itself is ignored.
    pub fn allows(&self, grid: &Grid, pos: Position, symbol: Symbol) -> bool {
        self.allows_index(grid.cells(), grid.index(pos), symbol)
    }

    /// Whether placing `symbol` at `pos` would finish three in a row.
    pub fn completes_run(&self, grid: &Grid, pos: Position, symbol: Symbol) -> bool {
        self.completes_run_index(grid.cells(), grid.index(pos), symbol)
    }

    /// No filled cell breaks a rule (empty cells are not judged).
    pub fn is_consistent(&self, grid: &Grid) -> bool {
        grid.size() == self.size
            && grid.cells().iter().enumerate().all(|(idx, cell)| match cell {
                Some(symbol) => self.allows_index(grid.cells(), idx, *symbol),
                None => true,
            })
    }

    /// A complete grid satisfying every rule.
    pub fn is_solution(&self, grid: &Grid) -> bool {
        grid.is_complete() && self.is_consistent(grid)
    }

    pub(crate) fn allows_index(&self, cells: &[Option<Symbol>], idx: usize, symbol: Symbol) -> bool {
        self.within_quota(cells, idx, symbol)
            && !self.completes_run_index(cells, idx, symbol)
            && self.links_agree(cells, idx, symbol)
    }

    /// Filled orthogonal neighbours plus filled link partners.
    pub(crate) fn fixed_neighbours(&self, cells: &[Option<Symbol>], idx: usize) -> usize {
        let (row, col) = (idx / self.size, idx % self.size);
        let mut count = 0;
        if row > 0 && cells[idx - self.size].is_some() {
            count += 1;
        }
        if row + 1 < self.size && cells[idx + self.size].is_some() {
            count += 1;
        }
        if col > 0 && cells[idx - 1].is_some() {
            count += 1;
        }
        if col + 1 < self.size && cells[idx + 1].is_some() {
            count += 1;
        }
        count
            + self.partners[idx]
                .iter()
                .filter(|(other, _)| cells[*other].is_some())
                .count()
    }

    fn within_quota(&self, cells: &[Option<Symbol>], idx: usize, symbol: Symbol) -> bool {
        let (row, col) = (idx / self.size, idx % self.size);
        let in_row = (0..self.size)
            .filter(|&c| c != col && cells[row * self.size + c] == Some(symbol))
            .count();
        let in_col = (0..self.size)
            .filter(|&r| r != row && cells[r * self.size + col] == Some(symbol))
            .count();
        in_row < self.half() && in_col < self.half()
    }

    fn completes_run_index(&self, cells: &[Option<Symbol>], idx: usize, symbol: Symbol) -> bool {
        let n = self.size;
        let (row, col) = (idx / n, idx % n);
        let is = |r: usize, c: usize| cells[r * n + c] == Some(symbol);

        // Horizontal: X X _, X _ X, _ X X
        if col >= 2 && is(row, col - 1) && is(row, col - 2) {
            return true;
        }
        if col >= 1 && col + 1 < n && is(row, col - 1) && is(row, col + 1) {
            return true;
        }
        if col + 2 < n && is(row, col + 1) && is(row, col + 2) {
            return true;
        }

        // Vertical
        if row >= 2 && is(row - 1, col) && is(row - 2, col) {
            return true;
        }
        if row >= 1 && row + 1 < n && is(row - 1, col) && is(row + 1, col) {
            return true;
        }
        row + 2 < n && is(row + 1, col) && is(row + 2, col)
    }

    fn links_agree(&self, cells: &[Option<Symbol>], idx: usize, symbol: Symbol) -> bool {
        self.partners[idx].iter().all(|&(other, kind)| match cells[other] {
            Some(partner) => kind.holds(symbol, partner),
            None => true,
        })
    }
}
