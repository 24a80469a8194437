//! Link constraints between cell pairs and the puzzle value objects.

use crate::{Difficulty, Grid, Position, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship a link imposes on its two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Both cells hold the same symbol (`=` on the board).
    Equal,
    /// The cells hold different symbols (`×` on the board).
    Opposite,
}

impl LinkKind {
    /// Whether the pair of symbols satisfies this link.
    pub fn holds(self, a: Symbol, b: Symbol) -> bool {
        match self {
            LinkKind::Equal => a == b,
            LinkKind::Opposite => a != b,
        }
    }

    /// The symbol the partner cell must take when one side holds `known`.
    pub fn partner_of(self, known: Symbol) -> Symbol {
        match self {
            LinkKind::Equal => known,
            LinkKind::Opposite => known.opposite(),
        }
    }

    /// Classify a pair of solved cells.
    pub fn between(a: Symbol, b: Symbol) -> LinkKind {
        if a == b {
            LinkKind::Equal
        } else {
            LinkKind::Opposite
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Equal => write!(f, "equal"),
            LinkKind::Opposite => write!(f, "opposite"),
        }
    }
}

/// A link between two cells, serialized as `{type, row1, col1, row2, col2}`.
///
/// Any two distinct cells are accepted; the generator only ever produces
/// adjacent pairs. Range checks happen when a [`crate::Rules`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub row1: usize,
    pub col1: usize,
    pub row2: usize,
    pub col2: usize,
}

impl Link {
    pub fn new(kind: LinkKind, a: Position, b: Position) -> Self {
        Self {
            kind,
            row1: a.row,
            col1: a.col,
            row2: b.row,
            col2: b.col,
        }
    }

    pub fn equal(a: Position, b: Position) -> Self {
        Self::new(LinkKind::Equal, a, b)
    }

    pub fn opposite(a: Position, b: Position) -> Self {
        Self::new(LinkKind::Opposite, a, b)
    }

    pub fn first(&self) -> Position {
        Position::new(self.row1, self.col1)
    }

    pub fn second(&self) -> Position {
        Position::new(self.row2, self.col2)
    }

    pub fn involves(&self, pos: Position) -> bool {
        self.first() == pos || self.second() == pos
    }
}

/// A puzzle as presented to a player: givens, links and its difficulty tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub grid: Grid,
    pub constraints: Vec<Link>,
    pub difficulty: Difficulty,
}

impl Puzzle {
    pub fn given_count(&self) -> usize {
        self.grid.filled_count()
    }
}

/// Generator output: the puzzle plus the solution it was carved from.
///
/// The solution is meant for the caller's storage (hint checking and the
/// like) and should not be shown to the player ahead of solving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPuzzle {
    pub puzzle: Puzzle,
    pub solution: Grid,
}

impl GeneratedPuzzle {
    pub fn into_parts(self) -> (Puzzle, Grid) {
        (self.puzzle, self.solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_wire_format() {
        let link = Link::opposite(Position::new(0, 1), Position::new(1, 1));
        let json = serde_json::to_value(link).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "opposite", "row1": 0, "col1": 1, "row2": 1, "col2": 1})
        );
        let back: Link = serde_json::from_value(json).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn test_link_kind_semantics() {
        assert!(LinkKind::Equal.holds(Symbol::Sun, Symbol::Sun));
        assert!(!LinkKind::Equal.holds(Symbol::Sun, Symbol::Moon));
        assert!(LinkKind::Opposite.holds(Symbol::Moon, Symbol::Sun));
        assert_eq!(LinkKind::Opposite.partner_of(Symbol::Sun), Symbol::Moon);
        assert_eq!(LinkKind::between(Symbol::Moon, Symbol::Moon), LinkKind::Equal);
    }
}
