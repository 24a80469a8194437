//! Board representation: symbols, positions and the square grid.

use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Board dimension used by the game.
pub const DEFAULT_SIZE: usize = 6;

/// One of the two symbols a cell can hold.
///
/// Serialized as `"A"` (sun) and `"B"` (moon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "A")]
    Sun,
    #[serde(rename = "B")]
    Moon,
}

impl Symbol {
    /// Both symbols, sun first. Deduction scans try them in this order.
    pub const ALL: [Symbol; 2] = [Symbol::Sun, Symbol::Moon];

    /// The other symbol.
    pub fn opposite(self) -> Symbol {
        match self {
            Symbol::Sun => Symbol::Moon,
            Symbol::Moon => Symbol::Sun,
        }
    }

    /// Domain name used in explanation text.
    pub fn name(self) -> &'static str {
        match self {
            Symbol::Sun => "sun",
            Symbol::Moon => "moon",
        }
    }

    /// Single-character form used by the text grid format.
    pub fn to_char(self) -> char {
        match self {
            Symbol::Sun => 'A',
            Symbol::Moon => 'B',
        }
    }

    /// Parse a text grid character. Accepts `A`/`S` for sun and `B`/`M` for moon.
    pub fn from_char(c: char) -> Option<Symbol> {
        match c.to_ascii_uppercase() {
            'A' | 'S' => Some(Symbol::Sun),
            'B' | 'M' => Some(Symbol::Moon),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A cell coordinate, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance of exactly one.
    pub fn is_adjacent(&self, other: Position) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// The cell reached by a 180-degree rotation of a `size`-wide board.
    pub fn rotated(&self, size: usize) -> Position {
        Position::new(size - 1 - self.row, size - 1 - self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Square board of optional symbols, stored row-major.
///
/// On the wire a grid is an array of rows, each an array of `null | "A" | "B"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Option<Symbol>>>", into = "Vec<Vec<Option<Symbol>>>")]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Symbol>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    /// Create an empty board. The size must be even so rows can balance.
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if size == 0 || size % 2 != 0 {
            return Err(EngineError::InvalidSize(size));
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
        })
    }

    /// Empty board of the default dimension.
    pub fn empty() -> Self {
        Self {
            size: DEFAULT_SIZE,
            cells: vec![None; DEFAULT_SIZE * DEFAULT_SIZE],
        }
    }

    /// Build a grid from row vectors, checking that it is square and even.
    pub fn from_rows(rows: Vec<Vec<Option<Symbol>>>) -> Result<Self, EngineError> {
        let size = rows.len();
        let mut grid = Self::new(size)?;
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(EngineError::InvalidDimensions {
                    expected: size,
                    found: format!("row {} has {} cells", row, values.len()),
                });
            }
            for (col, value) in values.into_iter().enumerate() {
                grid.cells[row * size + col] = value;
            }
        }
        Ok(grid)
    }

    /// Parse a compact text grid such as `"AB..AB/......"`.
    ///
    /// Whitespace and `/` are ignored; `.`, `_` and `0` mark empty cells.
    pub fn from_string(s: &str) -> Result<Self, EngineError> {
        let mut cells = Vec::new();
        for c in s.chars().filter(|c| !c.is_whitespace() && *c != '/') {
            match c {
                '.' | '_' | '0' => cells.push(None),
                other => cells.push(Some(
                    Symbol::from_char(other).ok_or(EngineError::InvalidSymbol(other))?,
                )),
            }
        }
        let size = (cells.len() as f64).sqrt() as usize;
        if size * size != cells.len() {
            return Err(EngineError::InvalidDimensions {
                expected: size,
                found: format!("{} cells is not a square board", cells.len()),
            });
        }
        let mut grid = Self::new(size)?;
        grid.cells = cells;
        Ok(grid)
    }

    /// Row vectors, the inverse of [`Grid::from_rows`].
    pub fn to_rows(&self) -> Vec<Vec<Option<Symbol>>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of each symbol a complete row or column holds.
    pub fn half(&self) -> usize {
        self.size / 2
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    /// # Panics
    ///
    /// Panics if `pos` is off the board. Use [`Grid::try_get`] for
    /// unchecked coordinates.
    pub fn get(&self, pos: Position) -> Option<Symbol> {
        self.cells[self.checked_index(pos)]
    }

    /// The cell at `pos`, or `None` when `pos` is off the board.
    pub fn try_get(&self, pos: Position) -> Option<Option<Symbol>> {
        self.contains(pos).then(|| self.cells[self.index(pos)])
    }

    /// # Panics
    ///
    /// Panics if `pos` is off the board.
    pub fn set(&mut self, pos: Position, value: Option<Symbol>) {
        let idx = self.checked_index(pos);
        self.cells[idx] = value;
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let size = self.size;
        (0..size * size).map(move |i| Position::new(i / size, i % size))
    }

    pub fn empty_positions(&self) -> Vec<Position> {
        self.positions().filter(|&p| self.is_empty_at(p)).collect()
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.filled_count()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    pub fn row(&self, row: usize) -> &[Option<Symbol>] {
        &self.cells[row * self.size..(row + 1) * self.size]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = Option<Symbol>> + '_ {
        (0..self.size).map(move |row| self.cells[row * self.size + col])
    }

    pub fn count_in_row(&self, row: usize, symbol: Symbol) -> usize {
        self.row(row).iter().filter(|&&c| c == Some(symbol)).count()
    }

    pub fn count_in_column(&self, col: usize, symbol: Symbol) -> usize {
        self.column(col).filter(|&c| c == Some(symbol)).count()
    }

    /// True when every filled cell of `self` holds the same value in `other`.
    pub fn is_subset_of(&self, other: &Grid) -> bool {
        self.size == other.size
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(mine, theirs)| mine.is_none() || mine == theirs)
    }

    pub(crate) fn index(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }

    // A column past the edge would otherwise alias a cell in the next row.
    fn checked_index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {} is off the {}x{} board",
            pos,
            self.size,
            self.size
        );
        self.index(pos)
    }

    pub(crate) fn cells(&self) -> &[Option<Symbol>] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Option<Symbol>] {
        &mut self.cells
    }
}

impl TryFrom<Vec<Vec<Option<Symbol>>>> for Grid {
    type Error = EngineError;

    fn try_from(rows: Vec<Vec<Option<Symbol>>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<Option<Symbol>>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.size).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                let c = cell.map(Symbol::to_char).unwrap_or('.');
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_get_off_board() {
        let mut grid = Grid::empty();
        grid.set(Position::new(5, 5), Some(Symbol::Moon));
        assert_eq!(grid.try_get(Position::new(5, 5)), Some(Some(Symbol::Moon)));
        assert_eq!(grid.try_get(Position::new(0, 0)), Some(None));
        assert_eq!(grid.try_get(Position::new(0, 6)), None);
        assert_eq!(grid.try_get(Position::new(6, 0)), None);
    }

    #[test]
    #[should_panic(expected = "off the 6x6 board")]
    fn test_get_off_board_panics() {
        Grid::empty().get(Position::new(0, 7));
    }

    #[test]
    #[should_panic(expected = "off the 6x6 board")]
    fn test_set_off_board_panics() {
        Grid::empty().set(Position::new(1, 6), Some(Symbol::Sun));
    }

    #[test]
    fn test_rejects_odd_size() {
        assert_eq!(Grid::new(5), Err(EngineError::InvalidSize(5)));
        assert_eq!(Grid::new(0), Err(EngineError::InvalidSize(0)));
        assert!(Grid::new(8).is_ok());
    }

    #[test]
    fn test_from_string_and_display() {
        let grid = Grid::from_string("AB.... / ...... / ...... / ...... / ...... / .....B").unwrap();
        assert_eq!(grid.size(), 6);
        assert_eq!(grid.get(Position::new(0, 0)), Some(Symbol::Sun));
        assert_eq!(grid.get(Position::new(0, 1)), Some(Symbol::Moon));
        assert_eq!(grid.get(Position::new(5, 5)), Some(Symbol::Moon));
        assert_eq!(grid.filled_count(), 3);
        assert_eq!(grid.to_string().lines().next(), Some("AB...."));
    }

    #[test]
    fn test_from_string_rejects_bad_input() {
        assert_eq!(Grid::from_string("ABX."), Err(EngineError::InvalidSymbol('X')));
        assert!(matches!(
            Grid::from_string("AB."),
            Err(EngineError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![None, None], vec![None]];
        assert!(matches!(
            Grid::from_rows(rows),
            Err(EngineError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_wire_format() {
        let mut grid = Grid::new(2).unwrap();
        grid.set(Position::new(0, 0), Some(Symbol::Sun));
        grid.set(Position::new(1, 1), Some(Symbol::Moon));
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r#"[["A",null],[null,"B"]]"#);

        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
        assert!(serde_json::from_str::<Grid>(r#"[["A"],[null,"B"]]"#).is_err());
    }

    #[test]
    fn test_line_counts() {
        let grid = Grid::from_string("AABB.. A..... B..... ...... ...... ......").unwrap();
        assert_eq!(grid.count_in_row(0, Symbol::Sun), 2);
        assert_eq!(grid.count_in_row(0, Symbol::Moon), 2);
        assert_eq!(grid.count_in_column(0, Symbol::Sun), 2);
        assert_eq!(grid.count_in_column(0, Symbol::Moon), 1);
    }

    #[test]
    fn test_adjacency_and_rotation() {
        let p = Position::new(2, 3);
        assert!(p.is_adjacent(Position::new(2, 4)));
        assert!(p.is_adjacent(Position::new(1, 3)));
        assert!(!p.is_adjacent(Position::new(3, 4)));
        assert!(!p.is_adjacent(p));
        assert_eq!(p.rotated(6), Position::new(3, 2));
    }
}
