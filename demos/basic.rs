//! Basic example of using the Tango engine

use tango_core::{validate, Difficulty, DifficultyAnalyzer, Generator, Grid, Solver};

fn main() -> Result<(), tango_core::EngineError> {
    // Generate a puzzle
    println!("Generating a Medium difficulty puzzle...\n");
    let mut generator = Generator::new();
    let generated = generator.generate(Difficulty::Medium)?;
    let puzzle = &generated.puzzle;

    println!("Generated puzzle:");
    println!("{}", puzzle.grid);
    println!("Given cells: {}", puzzle.given_count());
    for link in &puzzle.constraints {
        println!("  {} {} {}", link.first(), link.kind, link.second());
    }

    // Rate the difficulty
    let report = DifficultyAnalyzer::new().analyze(&puzzle.grid, &puzzle.constraints)?;
    if let (Some(rated), Some(metrics)) = (report.difficulty, &report.metrics) {
        println!("\nRated difficulty: {} (score {:.1})", rated, metrics.difficulty_score);
    }

    // Solve it
    println!("\nSolving...\n");
    let solver = Solver::new();
    let solved = solver.solve_report(&puzzle.grid, &puzzle.constraints)?;
    match &solved.solution {
        Some(solution) => {
            println!("Solution ({} steps, unique: {}):", solved.steps.len(), solved.unique);
            println!("{}", solution);
        }
        None => println!("No solution found"),
    }

    // Get a hint for the unsolved puzzle
    println!("\nGetting a hint for the unsolved puzzle:");
    if let Some(hint) = solver.hint(&puzzle.grid, &puzzle.constraints)? {
        println!("Rule: {}", hint.rule.title());
        println!("Explanation: {}", hint.explanation);
    }

    // Check a player's grid
    println!("\n--- Validating a grid from text ---\n");
    let grid = Grid::from_string("AAAA.. ...... ...... ...... ...... ......")?;
    println!("{}", grid);
    for error in validate(&grid, &[])?.errors {
        println!("  {}", error.message);
    }

    // Count completions of the empty board
    let solutions = solver.count_solutions(&Grid::empty(), &[], 2)?;
    println!("\nSolutions of the empty board (up to 2): {}", solutions);
    Ok(())
}
