use crate::explain::ExplanationStep;
use crate::{Grid, Position, Symbol};
use serde::{Deserialize, Serialize};

/// Difficulty level of a puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Get all difficulties, easiest first
    pub fn all_levels() -> &'static [Difficulty] {
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    /// Map an analyzer score (0-100) onto a level
    pub fn from_score(score: f64) -> Difficulty {
        if score <= 30.0 {
            Difficulty::Easy
        } else if score <= 60.0 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Deduction rule behind an explanation step (ordered by priority)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    RowCount,
    ColumnCount,
    ConsecutivePrevention,
    EqualConstraint,
    OppositeConstraint,
    /// Fallback: the cell is copied from the known solution.
    AdvancedDeduction,
}

impl Rule {
    pub fn all() -> &'static [Rule] {
        &[
            Rule::RowCount,
            Rule::ColumnCount,
            Rule::ConsecutivePrevention,
            Rule::EqualConstraint,
            Rule::OppositeConstraint,
            Rule::AdvancedDeduction,
        ]
    }

    /// Weight used by the difficulty score
    pub fn weight(&self) -> f64 {
        match self {
            Rule::RowCount | Rule::ColumnCount => 1.0,
            Rule::ConsecutivePrevention => 2.0,
            Rule::EqualConstraint | Rule::OppositeConstraint => 1.5,
            Rule::AdvancedDeduction => 3.0,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Rule::EqualConstraint | Rule::OppositeConstraint)
    }

    /// Wire tag, e.g. `row_count`
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::RowCount => "row_count",
            Rule::ColumnCount => "column_count",
            Rule::ConsecutivePrevention => "consecutive_prevention",
            Rule::EqualConstraint => "equal_constraint",
            Rule::OppositeConstraint => "opposite_constraint",
            Rule::AdvancedDeduction => "advanced_deduction",
        }
    }

    /// Human-facing rule title
    pub fn title(&self) -> &'static str {
        match self {
            Rule::RowCount => "Row Count Rule",
            Rule::ColumnCount => "Column Count Rule",
            Rule::ConsecutivePrevention => "No Three Consecutive Rule",
            Rule::EqualConstraint => "Equal Constraint Rule",
            Rule::OppositeConstraint => "Opposite Constraint Rule",
            Rule::AdvancedDeduction => "Advanced Deduction",
        }
    }

    /// Generic advice shown next to a step
    pub fn tip(&self) -> &'static str {
        match self {
            Rule::RowCount => {
                "Count the symbols in each row. Each row needs the same number of suns and moons."
            }
            Rule::ColumnCount => {
                "Count the symbols in each column. Each column needs the same number of suns and moons."
            }
            Rule::ConsecutivePrevention => {
                "Look for patterns where placing a symbol would create three in a row."
            }
            Rule::EqualConstraint => "Cells connected by '=' must have the same symbol.",
            Rule::OppositeConstraint => "Cells connected by '×' must have opposite symbols.",
            Rule::AdvancedDeduction => "Sometimes you need to consider multiple constraints together.",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A hint for the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub row: usize,
    pub col: usize,
    pub value: Symbol,
    /// Explanation of the hint
    pub explanation: String,
    /// The rule that justifies the placement
    pub rule: Rule,
}

impl Hint {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

/// Result of the `solve` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub success: bool,
    pub solution: Option<Grid>,
    pub steps: Vec<ExplanationStep>,
    pub unique: bool,
}

/// Result of the `check` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub solvable: bool,
    pub unique: bool,
}
