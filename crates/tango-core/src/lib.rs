//! Tango puzzle engine
//!
//! Tango is played on an even-sized square board where every cell holds a
//! sun or a moon. A solved board has:
//!
//! - as many suns as moons in every row and column
//! - no three equal symbols side by side, horizontally or vertically
//! - every `=` link joining equal symbols and every `×` link joining
//!   opposite ones
//!
//! This crate solves, validates, generates, rates and explains such
//! puzzles. Every operation is a pure function of its inputs; nothing is
//! retained between calls.
//!
//! ```
//! use tango_core::{validate, Grid, Link, Position, Solver};
//!
//! let grid = Grid::from_string("AB.... ...... ...... ...... ...... ......").unwrap();
//! let links = [Link::opposite(Position::new(0, 1), Position::new(0, 2))];
//!
//! let solution = Solver::new().solve(&grid, &links).unwrap().into_grid().unwrap();
//! assert!(validate(&solution, &links).unwrap().complete);
//! ```

mod constraint;
mod error;
mod grid;
mod rules;

pub mod difficulty;
pub mod explain;
pub mod generator;
pub mod solver;
pub mod validator;


pub use constraint::{GeneratedPuzzle, Link, LinkKind, Puzzle};
pub use difficulty::{DifficultyAnalyzer, DifficultyReport, Metrics};
pub use error::EngineError;
pub use explain::{
    apply_steps, explain_steps, DetailedStep, Explanation, ExplanationStep, SolutionSummary,
};
pub use generator::{Generator, GeneratorConfig, SymmetryType};
pub use grid::{Grid, Position, Symbol, DEFAULT_SIZE};
pub use rules::Rules;
pub use solver::{
    CancellationToken, CheckReport, Difficulty, Hint, Rule, SolveOutcome, SolveReport, Solver,
    SolverConfig,
};
pub use validator::{validate, validate_sized, RuleViolation, ValidationResult, ViolationKind};
