//! Puzzle generation: seed a solution, derive links from it, then carve
//! givens away while the puzzle stays uniquely solvable.

use crate::validator;
use crate::{
    Difficulty, EngineError, GeneratedPuzzle, Grid, Link, LinkKind, Position, Puzzle, SolveOutcome,
    Solver, SolverConfig, Symbol,
};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Symmetry applied to the givens once removal is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetryType {
    /// No symmetry
    None,
    /// 180-degree rotational symmetry
    Rotational180,
}

impl Default for SymmetryType {
    fn default() -> Self {
        Self::Rotational180
    }
}

/// Configuration for puzzle generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Target difficulty
    pub difficulty: Difficulty,
    /// Board dimension
    pub size: usize,
    /// Random cells fixed before the first solve
    pub seed_cells: usize,
    /// Acceptable number of givens in the finished puzzle
    pub given_range: RangeInclusive<usize>,
    /// Number of links to derive from the solution
    pub link_range: RangeInclusive<usize>,
    /// Maximum attempts before giving up
    pub max_attempts: usize,
    /// Maximum reseeds while looking for a full solution
    pub max_seed_attempts: usize,
    pub symmetry: SymmetryType,
    /// Limits applied to every solver call made during generation
    pub solver: SolverConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::medium()
    }
}

impl GeneratorConfig {
    pub fn easy() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            size: crate::DEFAULT_SIZE,
            seed_cells: 3,
            given_range: 22..=26,
            link_range: 4..=6,
            max_attempts: 50,
            max_seed_attempts: 20,
            symmetry: SymmetryType::Rotational180,
            solver: SolverConfig::default(),
        }
    }

    pub fn medium() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            given_range: 12..=16,
            link_range: 6..=10,
            max_attempts: 100,
            ..Self::easy()
        }
    }

    pub fn hard() -> Self {
        Self {
            difficulty: Difficulty::Hard,
            given_range: 6..=10,
            link_range: 10..=15,
            max_attempts: 200,
            ..Self::easy()
        }
    }

    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self::easy(),
            Difficulty::Medium => Self::medium(),
            Difficulty::Hard => Self::hard(),
        }
    }
}

/// Tango puzzle generator
pub struct Generator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Create a new generator with default configuration
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    /// Create a generator with custom configuration
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with a specific seed for reproducibility
    pub fn with_seed(seed: u64) -> Self {
        Self::with_config_and_seed(GeneratorConfig::default(), seed)
    }

    pub fn with_config_and_seed(config: GeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a puzzle using the preset for `difficulty`.
    ///
    /// Solver limits of the current configuration carry over.
    pub fn generate(&mut self, difficulty: Difficulty) -> Result<GeneratedPuzzle, EngineError> {
        self.config = GeneratorConfig {
            solver: self.config.solver.clone(),
            ..GeneratorConfig::for_difficulty(difficulty)
        };
        self.generate_with_config()
    }

    /// Generate a puzzle with the current configuration
    pub fn generate_with_config(&mut self) -> Result<GeneratedPuzzle, EngineError> {
        self.check_config()?;
        let solver = Solver::with_config(
            self.config
                .solver
                .clone()
                .with_expected_size(self.config.size),
        );
        let difficulty = self.config.difficulty;

        for attempt in 1..=self.config.max_attempts {
            let Some(solution) = self.seed_solution(&solver)? else {
                debug!("attempt {}: no full solution from random seeds", attempt);
                continue;
            };

            let links = self.derive_links(&solution);
            let target = self.rng.gen_range(self.config.given_range.clone());
            let mut grid = self.remove_givens(&solution, &links, target, &solver)?;
            if self.config.symmetry == SymmetryType::Rotational180 {
                grid = self.apply_symmetry(grid, &solution, &links, &solver)?;
            }

            let givens = grid.filled_count();
            if !self.config.given_range.contains(&givens) {
                debug!(
                    "attempt {}: {} givens outside {:?}",
                    attempt, givens, self.config.given_range
                );
                continue;
            }
            if !solver.is_unique(&grid, &links)? {
                debug!("attempt {}: final puzzle is not unique", attempt);
                continue;
            }
            if !validator::validate_sized(&solution, &links, self.config.size)?.complete {
                debug!("attempt {}: solution failed validation", attempt);
                continue;
            }

            info!(
                "generated {} puzzle with {} givens and {} links after {} attempt(s)",
                difficulty,
                givens,
                links.len(),
                attempt
            );
            return Ok(GeneratedPuzzle {
                puzzle: Puzzle {
                    grid,
                    constraints: links,
                    difficulty,
                },
                solution,
            });
        }

        Err(EngineError::AmbiguousGeneration {
            difficulty,
            attempts: self.config.max_attempts,
        })
    }

    /// Reject settings that would make every attempt fail or panic.
    fn check_config(&self) -> Result<(), EngineError> {
        let size = self.config.size;
        Grid::new(size)?;

        let given_range = &self.config.given_range;
        if given_range.is_empty() {
            return Err(EngineError::InvalidConfig(format!(
                "given range {:?} is empty",
                given_range
            )));
        }
        if *given_range.start() > size * size {
            return Err(EngineError::InvalidConfig(format!(
                "given range {:?} starts above the {} cells of a {}x{} board",
                given_range,
                size * size,
                size,
                size
            )));
        }

        let link_range = &self.config.link_range;
        let pairs = 2 * size * (size - 1);
        if link_range.is_empty() {
            return Err(EngineError::InvalidConfig(format!(
                "link range {:?} is empty",
                link_range
            )));
        }
        if *link_range.start() > pairs {
            return Err(EngineError::InvalidConfig(format!(
                "link range {:?} starts above the {} adjacent pairs of a {}x{} board",
                link_range, pairs, size, size
            )));
        }
        Ok(())
    }

    /// Fix a few random cells and solve without links.
    ///
    /// Random seeds can contradict each other, so reseed a bounded number of
    /// times. `None` means every reseed failed.
    fn seed_solution(&mut self, solver: &Solver) -> Result<Option<Grid>, EngineError> {
        let empty = Grid::new(self.config.size)?;
        let mut positions: Vec<Position> = empty.positions().collect();

        for _ in 0..self.config.max_seed_attempts {
            let mut grid = empty.clone();
            positions.shuffle(&mut self.rng);
            for &pos in positions.iter().take(self.config.seed_cells) {
                let symbol = if self.rng.gen_bool(0.5) {
                    Symbol::Sun
                } else {
                    Symbol::Moon
                };
                grid.set(pos, Some(symbol));
            }

            if let SolveOutcome::Satisfiable(solution) = solver.solve(&grid, &[])? {
                return Ok(Some(solution));
            }
            trace!("seed cells contradict each other, reseeding");
        }
        Ok(None)
    }

    /// Pick random adjacent pairs and label each from the solution.
    fn derive_links(&mut self, solution: &Grid) -> Vec<Link> {
        let size = solution.size();
        let mut pairs = Vec::with_capacity(2 * size * (size - 1));
        for pos in solution.positions() {
            if pos.col + 1 < size {
                pairs.push((pos, Position::new(pos.row, pos.col + 1)));
            }
            if pos.row + 1 < size {
                pairs.push((pos, Position::new(pos.row + 1, pos.col)));
            }
        }
        pairs.shuffle(&mut self.rng);

        let count = self.rng.gen_range(self.config.link_range.clone());
        pairs
            .into_iter()
            .take(count)
            .filter_map(|(a, b)| {
                let kind = LinkKind::between(solution.get(a)?, solution.get(b)?);
                Some(Link::new(kind, a, b))
            })
            .collect()
    }

    /// Empty cells one at a time, keeping each removal only if the puzzle
    /// stays unique, until `target` givens remain or no cell can go.
    fn remove_givens(
        &mut self,
        solution: &Grid,
        links: &[Link],
        target: usize,
        solver: &Solver,
    ) -> Result<Grid, EngineError> {
        let mut grid = solution.clone();
        let mut order: Vec<Position> = grid.positions().collect();
        order.shuffle(&mut self.rng);

        // Hard puzzles keep linked cells as long as possible.
        if self.config.difficulty == Difficulty::Hard {
            let (mut free, mut linked): (Vec<Position>, Vec<Position>) = order
                .into_iter()
                .partition(|&p| !links.iter().any(|l| l.involves(p)));
            free.shuffle(&mut self.rng);
            linked.shuffle(&mut self.rng);
            free.extend(linked);
            order = free;
        }

        for pos in order {
            if grid.filled_count() <= target {
                break;
            }
            let mut trial = grid.clone();
            trial.set(pos, None);
            if solver.is_unique(&trial, links)? {
                trace!("removed {}", pos);
                grid = trial;
            } else {
                trace!("kept {}: removal breaks uniqueness", pos);
            }
        }
        Ok(grid)
    }

    /// Restore the rotated partner of every given. Falls back to `grid` when
    /// the result is not unique or has too many givens.
    fn apply_symmetry(
        &self,
        grid: Grid,
        solution: &Grid,
        links: &[Link],
        solver: &Solver,
    ) -> Result<Grid, EngineError> {
        let size = grid.size();
        let mut symmetric = grid.clone();
        for pos in grid.positions() {
            if grid.is_empty_at(pos) {
                continue;
            }
            let partner = pos.rotated(size);
            if symmetric.is_empty_at(partner) {
                symmetric.set(partner, solution.get(partner));
            }
        }

        if symmetric == grid {
            return Ok(grid);
        }
        if symmetric.filled_count() > *self.config.given_range.end() {
            trace!("symmetric givens exceed the range, keeping asymmetric puzzle");
            return Ok(grid);
        }
        if !solver.is_unique(&symmetric, links)? {
            return Ok(grid);
        }
        Ok(symmetric)
    }
}
