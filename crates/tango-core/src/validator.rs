//! Rule checking over a possibly incomplete grid.
//!
//! Only filled cells are judged and no search is performed, so validation is
//! cheap enough to run after every move.

use crate::{EngineError, Grid, Link, LinkKind, Position, Rules, Symbol, DEFAULT_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// More than half of one symbol in a row.
    RowCount,
    /// A full row that is not balanced.
    RowBalance,
    ColumnCount,
    ColumnBalance,
    /// Three identical symbols side by side.
    ConsecutiveHorizontal,
    ConsecutiveVertical,
    EqualConstraint,
    OppositeConstraint,
}

/// One broken rule and the cells it implicates.
///
/// Row and column errors implicate every cell of their line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    /// The over-represented symbol for count errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    pub cells: Vec<Position>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// No empty cell and no violation.
    pub complete: bool,
    pub errors: Vec<RuleViolation>,
}

impl ValidationResult {
    /// Every implicated cell, deduplicated, in row-major order.
    pub fn invalid_cells(&self) -> Vec<Position> {
        self.errors
            .iter()
            .flat_map(|e| e.cells.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Check every rule against the filled cells of a standard 6x6 `grid`.
///
/// Links whose endpoints are not both filled are skipped. Only malformed
/// links or a board of the wrong dimension produce an `Err`.
pub fn validate(grid: &Grid, links: &[Link]) -> Result<ValidationResult, EngineError> {
    validate_sized(grid, links, DEFAULT_SIZE)
}

/// [`validate`] for boards of dimension `expected`.
pub fn validate_sized(
    grid: &Grid,
    links: &[Link],
    expected: usize,
) -> Result<ValidationResult, EngineError> {
    if grid.size() != expected {
        return Err(EngineError::InvalidDimensions {
            expected,
            found: format!("got {}x{}", grid.size(), grid.size()),
        });
    }
    Rules::for_grid(grid, links)?;

    let mut errors = Vec::new();
    check_lines(grid, Line::Row, &mut errors);
    check_lines(grid, Line::Column, &mut errors);
    check_runs(grid, &mut errors);
    check_links(grid, links, &mut errors);

    let valid = errors.is_empty();
    Ok(ValidationResult {
        valid,
        complete: valid && grid.is_complete(),
        errors,
    })
}

#[derive(Clone, Copy)]
enum Line {
    Row,
    Column,
}

impl Line {
    fn cells(self, size: usize, index: usize) -> Vec<Position> {
        (0..size)
            .map(|i| match self {
                Line::Row => Position::new(index, i),
                Line::Column => Position::new(i, index),
            })
            .collect()
    }

    fn name(self) -> &'static str {
        match self {
            Line::Row => "Row",
            Line::Column => "Column",
        }
    }
}

fn check_lines(grid: &Grid, line: Line, errors: &mut Vec<RuleViolation>) {
    let (size, half) = (grid.size(), grid.half());

    for index in 0..size {
        let cells = line.cells(size, index);
        let count = |symbol: Symbol| cells.iter().filter(|&&p| grid.get(p) == Some(symbol)).count();
        let (suns, moons) = (count(Symbol::Sun), count(Symbol::Moon));
        let (row, col) = match line {
            Line::Row => (Some(index), None),
            Line::Column => (None, Some(index)),
        };
        let count_kind = match line {
            Line::Row => ViolationKind::RowCount,
            Line::Column => ViolationKind::ColumnCount,
        };

        for (symbol, n) in [(Symbol::Sun, suns), (Symbol::Moon, moons)] {
            if n > half {
                errors.push(RuleViolation {
                    kind: count_kind,
                    row,
                    col,
                    symbol: Some(symbol),
                    cells: cells.clone(),
                    message: format!("{} {} has {} {}s (max {})", line.name(), index, n, symbol, half),
                });
            }
        }

        if suns + moons == size && (suns != half || moons != half) {
            errors.push(RuleViolation {
                kind: match line {
                    Line::Row => ViolationKind::RowBalance,
                    Line::Column => ViolationKind::ColumnBalance,
                },
                row,
                col,
                symbol: None,
                cells: cells.clone(),
                message: format!(
                    "{} {} must have exactly {} suns and {} moons",
                    line.name(),
                    index,
                    half,
                    half
                ),
            });
        }
    }
}

fn check_runs(grid: &Grid, errors: &mut Vec<RuleViolation>) {
    let size = grid.size();
    if size < 3 {
        return;
    }

    for (line, kind, label) in [
        (Line::Row, ViolationKind::ConsecutiveHorizontal, "row"),
        (Line::Column, ViolationKind::ConsecutiveVertical, "column"),
    ] {
        for index in 0..size {
            let cells = line.cells(size, index);
            for window in cells.windows(3) {
                let values: Vec<Option<Symbol>> = window.iter().map(|&p| grid.get(p)).collect();
                if let [Some(a), Some(b), Some(c)] = values[..] {
                    if a == b && b == c {
                        errors.push(RuleViolation {
                            kind,
                            row: None,
                            col: None,
                            symbol: Some(a),
                            cells: window.to_vec(),
                            message: format!("Three consecutive {}s in {} {}", a, label, index),
                        });
                    }
                }
            }
        }
    }
}

fn check_links(grid: &Grid, links: &[Link], errors: &mut Vec<RuleViolation>) {
    for link in links {
        let (a, b) = (link.first(), link.second());
        let (Some(x), Some(y)) = (grid.get(a), grid.get(b)) else {
            continue;
        };
        if link.kind.holds(x, y) {
            continue;
        }
        let (kind, message) = match link.kind {
            LinkKind::Equal => (ViolationKind::EqualConstraint, "Cells must have the same value"),
            LinkKind::Opposite => (ViolationKind::OppositeConstraint, "Cells must have opposite values"),
        };
        errors.push(RuleViolation {
            kind,
            row: None,
            col: None,
            symbol: None,
            cells: vec![a, b],
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_empty_grid_is_valid_but_incomplete() {
        let result = validate(&Grid::empty(), &[]).unwrap();
        assert!(result.valid);
        assert!(!result.complete);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_wrong_dimensions_rejected() {
        let err = validate(&Grid::new(8).unwrap(), &[]).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidDimensions {
                expected: 6,
                found: "got 8x8".to_string(),
            }
        );
        assert!(validate(&Grid::new(2).unwrap(), &[]).is_err());

        let result = validate_sized(&Grid::new(8).unwrap(), &[], 8).unwrap();
        assert!(result.valid);
        assert!(!result.complete);
    }

    #[test]
    fn test_solved_grid_is_complete() {
        let grid = Grid::from_string("ABABAB BABABA ABABAB BABABA ABABAB BABABA").unwrap();
        let result = validate(&grid, &[Link::opposite(pos(0, 0), pos(0, 1))]).unwrap();
        assert!(result.valid);
        assert!(result.complete);
    }

    #[test]
    fn test_too_many_suns_in_row() {
        let grid = Grid::from_string("AAAA.. ...... ...... ...... ...... ......").unwrap();
        let result = validate(&grid, &[]).unwrap();
        assert!(!result.valid);
        assert!(!result.complete);

        let count_error = result
            .errors
            .iter()
            .find(|e| e.kind == ViolationKind::RowCount)
            .unwrap();
        assert_eq!(count_error.row, Some(0));
        assert_eq!(count_error.symbol, Some(Symbol::Sun));
        for col in 0..6 {
            assert!(count_error.cells.contains(&pos(0, col)));
        }
        assert_eq!(count_error.message, "Row 0 has 4 suns (max 3)");

        let runs = result
            .errors
            .iter()
            .filter(|e| e.kind == ViolationKind::ConsecutiveHorizontal)
            .count();
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_equal_link_violated() {
        let grid = Grid::from_string("AB.... ...... ...... ...... ...... ......").unwrap();
        let links = [Link::equal(pos(0, 0), pos(0, 1))];
        let result = validate(&grid, &links).unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ViolationKind::EqualConstraint);
        assert_eq!(result.errors[0].cells, vec![pos(0, 0), pos(0, 1)]);
    }

    #[test]
    fn test_opposite_link_violated() {
        let grid = Grid::from_string("...... ...B.. ...B.. ...... ...... ......").unwrap();
        let links = [Link::opposite(pos(1, 3), pos(2, 3))];
        let result = validate(&grid, &links).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ViolationKind::OppositeConstraint);
    }

    #[test]
    fn test_link_with_empty_endpoint_skipped() {
        let grid = Grid::from_string("A..... ...... ...... ...... ...... ......").unwrap();
        let links = [Link::opposite(pos(0, 0), pos(0, 1))];
        assert!(validate(&grid, &links).unwrap().valid);
    }

    #[test]
    fn test_full_unbalanced_column() {
        let grid = Grid::from_string("A..... A..... B..... A..... A..... B.....").unwrap();
        let result = validate(&grid, &[]).unwrap();
        let kinds: Vec<ViolationKind> = result.errors.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ViolationKind::ColumnCount));
        assert!(kinds.contains(&ViolationKind::ColumnBalance));
        assert!(!kinds.contains(&ViolationKind::ConsecutiveVertical));
    }

    #[test]
    fn test_vertical_run() {
        let grid = Grid::from_string("...... .B.... .B.... .B.... ...... ......").unwrap();
        let result = validate(&grid, &[]).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ViolationKind::ConsecutiveVertical);
        assert_eq!(result.errors[0].cells, vec![pos(1, 1), pos(2, 1), pos(3, 1)]);
        assert_eq!(result.errors[0].message, "Three consecutive moons in column 1");
    }

    #[test]
    fn test_invalid_cells_deduplicated() {
        let grid = Grid::from_string("AAAA.. ...... ...... ...... ...... ......").unwrap();
        let result = validate(&grid, &[]).unwrap();
        let cells = result.invalid_cells();
        assert_eq!(cells, (0..6).map(|c| pos(0, c)).collect::<Vec<_>>());
    }

    #[test]
    fn test_malformed_link_is_error() {
        let links = [Link::equal(pos(0, 0), pos(9, 0))];
        assert!(validate(&Grid::empty(), &links).is_err());
    }
}
