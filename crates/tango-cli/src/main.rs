mod store;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use store::{FileStore, PuzzleStore};
use tango_core::{
    validate, Difficulty, DifficultyAnalyzer, DifficultyReport, Explanation, Generator,
    GeneratorConfig, Grid, Hint, Link, Position, Solver, SolverConfig, ValidationResult,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tango", version, about = "Generate, solve and explain Tango puzzles")]
struct Cli {
    /// Directory holding generated puzzles
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Abort solver searches after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and store a new puzzle
    Generate {
        #[arg(long, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check a grid against the rules without solving
    Validate(PuzzleArgs),
    /// Solve and narrate the deduction steps
    Solve(PuzzleArgs),
    /// Suggest the next cell to fill
    Hint(PuzzleArgs),
    /// Detailed step-by-step explanation with a summary
    Explain(PuzzleArgs),
    /// Rate difficulty and suggest adjustments
    Analyze(PuzzleArgs),
    /// Report whether the puzzle is solvable and unique
    Check(PuzzleArgs),
}

#[derive(Args)]
struct PuzzleArgs {
    /// Id of a stored puzzle
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    id: Option<Uuid>,

    /// Current grid to use instead of the stored givens (JSON rows or text)
    #[arg(long, requires = "id")]
    grid: Option<PathBuf>,

    /// JSON file with `grid` and `constraints`
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Deserialize)]
struct PuzzleFile {
    grid: Grid,
    #[serde(default)]
    constraints: Vec<Link>,
}

#[derive(Serialize)]
struct GenerateOutput<'a> {
    id: Uuid,
    grid: &'a Grid,
    constraints: &'a [Link],
    difficulty: Difficulty,
    given_count: usize,
}

#[derive(Serialize)]
struct ValidateOutput {
    #[serde(flatten)]
    result: ValidationResult,
    invalid_cells: Vec<Position>,
}

#[derive(Serialize)]
struct HintOutput {
    hint: Option<Hint>,
}

#[derive(Serialize)]
struct ExplainOutput {
    success: bool,
    #[serde(flatten)]
    explanation: Option<Explanation>,
}

#[derive(Serialize)]
struct AnalyzeOutput {
    #[serde(flatten)]
    report: DifficultyReport,
    suggestions: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn run(cli: Cli) -> Result<()> {
    let mut store = FileStore::new(cli.store.unwrap_or_else(FileStore::default_dir));
    log::debug!("using puzzle store at {}", store.dir().display());

    let mut solver_config = SolverConfig::default();
    if let Some(ms) = cli.timeout_ms {
        solver_config = solver_config.with_timeout(Duration::from_millis(ms));
    }
    let solver = Solver::with_config(solver_config.clone());

    match cli.command {
        Command::Generate { difficulty, seed } => {
            let mut config = GeneratorConfig::for_difficulty(difficulty);
            config.solver = solver_config;
            let mut generator = match seed {
                Some(seed) => Generator::with_config_and_seed(config, seed),
                None => Generator::with_config(config),
            };
            let generated = generator
                .generate_with_config()
                .with_context(|| format!("generating {} puzzle", difficulty))?;

            let record = store.create(generated)?;
            print_json(&GenerateOutput {
                id: record.id,
                grid: &record.puzzle.grid,
                constraints: &record.puzzle.constraints,
                difficulty: record.puzzle.difficulty,
                given_count: record.puzzle.given_count(),
            })
        }
        Command::Validate(args) => {
            let (grid, links) = load_puzzle(&store, &args)?;
            let result = validate(&grid, &links)?;
            let invalid_cells = result.invalid_cells();
            print_json(&ValidateOutput {
                result,
                invalid_cells,
            })
        }
        Command::Solve(args) => {
            let (grid, links) = load_puzzle(&store, &args)?;
            print_json(&solver.solve_report(&grid, &links)?)
        }
        Command::Hint(args) => {
            let (grid, links) = load_puzzle(&store, &args)?;
            print_json(&HintOutput {
                hint: solver.hint(&grid, &links)?,
            })
        }
        Command::Explain(args) => {
            let (grid, links) = load_puzzle(&store, &args)?;
            let explanation = solver.explain(&grid, &links)?;
            print_json(&ExplainOutput {
                success: explanation.is_some(),
                explanation,
            })
        }
        Command::Analyze(args) => {
            let (grid, links) = load_puzzle(&store, &args)?;
            let report = DifficultyAnalyzer::with_solver(solver).analyze(&grid, &links)?;
            let suggestions = report.suggest_adjustments();
            print_json(&AnalyzeOutput {
                report,
                suggestions,
            })
        }
        Command::Check(args) => {
            let (grid, links) = load_puzzle(&store, &args)?;
            print_json(&solver.check(&grid, &links)?)
        }
    }
}

/// Resolve `--id`/`--grid` or `--input` into a grid and its links.
fn load_puzzle(store: &impl PuzzleStore, args: &PuzzleArgs) -> Result<(Grid, Vec<Link>)> {
    if let Some(path) = &args.input {
        let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let file: PuzzleFile =
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
        return Ok((file.grid, file.constraints));
    }

    let Some(id) = args.id else {
        bail!("either --id or --input is required");
    };
    let Some(record) = store.get(id)? else {
        bail!("no stored puzzle with id {}", id);
    };

    let grid = match &args.grid {
        Some(path) => read_grid(path)?,
        None => record.puzzle.grid,
    };
    Ok((grid, record.puzzle.constraints))
}

/// A grid file holds either JSON rows or the compact text form.
fn read_grid(path: &Path) -> Result<Grid> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_grid(&text).with_context(|| format!("parsing grid in {}", path.display()))
}

fn parse_grid(text: &str) -> Result<Grid> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }
    Ok(Grid::from_string(text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use store::MemoryStore;
    use tango_core::Symbol;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from(["tango", "generate", "--difficulty", "hard", "--seed", "4"]);
        match cli.command {
            Command::Generate { difficulty, seed } => {
                assert_eq!(difficulty, Difficulty::Hard);
                assert_eq!(seed, Some(4));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_puzzle_source_required() {
        assert!(Cli::try_parse_from(["tango", "solve"]).is_err());
        let id = Uuid::new_v4().to_string();
        assert!(Cli::try_parse_from(["tango", "solve", "--input", "p.json", "--id", &id]).is_err());
        assert!(Cli::try_parse_from(["tango", "check", "--input", "p.json"]).is_ok());
    }

    #[test]
    fn test_parse_grid_text_and_json() {
        let text = parse_grid("AB....\n......\n......\n......\n......\n......\n").unwrap();
        assert_eq!(text.get(Position::new(0, 1)), Some(Symbol::Moon));

        let json = parse_grid(&serde_json::to_string(&text).unwrap()).unwrap();
        assert_eq!(json, text);
        assert!(parse_grid("AB").is_err());
    }

    #[test]
    fn test_load_stored_puzzle() {
        let mut store = MemoryStore::new();
        let generated = Generator::with_seed(2).generate(Difficulty::Easy).unwrap();
        let record = store.create(generated).unwrap();

        let args = PuzzleArgs {
            id: Some(record.id),
            grid: None,
            input: None,
        };
        let (grid, links) = load_puzzle(&store, &args).unwrap();
        assert_eq!(grid, record.puzzle.grid);
        assert_eq!(links, record.puzzle.constraints);

        let missing = PuzzleArgs {
            id: Some(Uuid::new_v4()),
            grid: None,
            input: None,
        };
        assert!(load_puzzle(&store, &missing).is_err());
    }

    #[test]
    fn test_puzzle_file_defaults_constraints() {
        let file: PuzzleFile = serde_json::from_str(
            r#"{"grid": [["A", null, null, null, null, null],
                         [null, null, null, null, null, null],
                         [null, null, null, null, null, null],
                         [null, null, null, null, null, null],
                         [null, null, null, null, null, null],
                         [null, null, null, null, null, "B"]]}"#,
        )
        .unwrap();
        assert!(file.constraints.is_empty());
        assert_eq!(file.grid.filled_count(), 2);
    }

    #[test]
    fn test_explain_output_flattens() {
        let grid = Grid::from_string("ABABA. BABABA ABABAB BABABA ABABAB BABABA").unwrap();
        let explanation = Solver::new().explain(&grid, &[]).unwrap();
        let json = serde_json::to_value(ExplainOutput {
            success: explanation.is_some(),
            explanation,
        })
        .unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["summary"]["total_steps"], 1);
        assert_eq!(json["steps"][0]["rule_applied"], "row_count");
    }
}
