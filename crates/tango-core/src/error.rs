use crate::Difficulty;
use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Rule violations and unsatisfiable boards are ordinary results and never
/// show up here; only malformed input, aborted searches and an exhausted
/// generation budget do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Board dimension is zero or odd, so rows cannot be balanced.
    #[error("board size must be a positive even number, got {0}")]
    InvalidSize(usize),

    /// Grid input is ragged or does not match the expected dimension.
    #[error("grid must be {expected}x{expected}: {found}")]
    InvalidDimensions { expected: usize, found: String },

    /// Unknown character in a textual grid.
    #[error("invalid symbol {0:?} in grid text")]
    InvalidSymbol(char),

    /// A link references a cell outside the board or links a cell to itself.
    #[error("constraint #{index} is malformed: {reason}")]
    MalformedConstraint { index: usize, reason: String },

    /// Generator settings that no puzzle can satisfy, such as an empty range.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// No unique puzzle could be produced within the retry budget.
    #[error("could not generate a unique {difficulty} puzzle after {attempts} attempts")]
    AmbiguousGeneration {
        difficulty: Difficulty,
        attempts: usize,
    },

    /// The caller cancelled the search.
    #[error("search cancelled")]
    Cancelled,

    /// The search ran past its configured deadline.
    #[error("search timed out")]
    Timeout,
}

impl EngineError {
    /// Whether the error came from an aborted search rather than bad input.
    pub fn is_aborted(&self) -> bool {
        matches!(self, EngineError::Cancelled | EngineError::Timeout)
    }
}
