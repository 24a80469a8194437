//! Step-by-step deduction narration.
//!
//! Starting from the given cells, one cell is deduced per step using the
//! first rule that applies, in priority order:
//!
//! 1. row/column saturation
//! 2. consecutive prevention
//! 3. link propagation
//! 4. fallback: copy the next empty cell from the known solution
//!
//! Rules 1-3 are sound, so as long as the givens agree with the solution,
//! replaying the steps reproduces the solution exactly.

use crate::solver::Rule;
use crate::{EngineError, Grid, Link, LinkKind, Position, Rules, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One deduced cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationStep {
    pub step_number: usize,
    pub row: usize,
    pub col: usize,
    pub value: Symbol,
    #[serde(rename = "rule_applied")]
    pub rule: Rule,
    pub explanation: String,
    /// Cells the deduction leans on: the run pair or the linked cell.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Position>,
}

impl ExplanationStep {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

struct Deduction {
    pos: Position,
    value: Symbol,
    rule: Rule,
    explanation: String,
    related: Vec<Position>,
}

impl Deduction {
    fn into_step(self, step_number: usize) -> ExplanationStep {
        ExplanationStep {
            step_number,
            row: self.pos.row,
            col: self.pos.col,
            value: self.value,
            rule: self.rule,
            explanation: self.explanation,
            related: self.related,
        }
    }
}

/// Narrate the solution of `initial` as ordered deduction steps.
///
/// `solution` is only consulted by the fallback rule.
pub fn explain_steps(
    initial: &Grid,
    solution: &Grid,
    links: &[Link],
) -> Result<Vec<ExplanationStep>, EngineError> {
    if solution.size() != initial.size() {
        return Err(EngineError::InvalidDimensions {
            expected: initial.size(),
            found: format!("solution is {}x{}", solution.size(), solution.size()),
        });
    }
    let rules = Rules::for_grid(initial, links)?;
    Ok(deduce_steps(&rules, initial, solution))
}

pub(crate) fn deduce_steps(rules: &Rules, initial: &Grid, solution: &Grid) -> Vec<ExplanationStep> {
    let mut working = initial.clone();
    let mut steps = Vec::new();

    while !working.is_complete() {
        let deduction = find_saturation(&working)
            .or_else(|| find_consecutive(rules, &working))
            .or_else(|| find_link(rules, &working))
            .or_else(|| find_fallback(&working, solution));

        // Only reachable when the solution has holes.
        let Some(deduction) = deduction else {
            break;
        };

        working.set(deduction.pos, Some(deduction.value));
        steps.push(deduction.into_step(steps.len() + 1));
    }

    steps
}

/// Replay steps onto a copy of `initial`.
pub fn apply_steps(initial: &Grid, steps: &[ExplanationStep]) -> Grid {
    let mut grid = initial.clone();
    for step in steps {
        grid.set(step.position(), Some(step.value));
    }
    grid
}

fn find_saturation(grid: &Grid) -> Option<Deduction> {
    let half = grid.half();

    for row in 0..grid.size() {
        for symbol in Symbol::ALL {
            if grid.count_in_row(row, symbol) < half {
                continue;
            }
            if let Some(col) = grid.row(row).iter().position(|c| c.is_none()) {
                return Some(Deduction {
                    pos: Position::new(row, col),
                    value: symbol.opposite(),
                    rule: Rule::RowCount,
                    explanation: format!(
                        "Row {} already has {} {}s, so remaining cells must be {}s",
                        row,
                        half,
                        symbol,
                        symbol.opposite()
                    ),
                    related: Vec::new(),
                });
            }
        }
    }

    for col in 0..grid.size() {
        for symbol in Symbol::ALL {
            if grid.count_in_column(col, symbol) < half {
                continue;
            }
            if let Some(row) = grid.column(col).position(|c| c.is_none()) {
                return Some(Deduction {
                    pos: Position::new(row, col),
                    value: symbol.opposite(),
                    rule: Rule::ColumnCount,
                    explanation: format!(
                        "Column {} already has {} {}s, so remaining cells must be {}s",
                        col,
                        half,
                        symbol,
                        symbol.opposite()
                    ),
                    related: Vec::new(),
                });
            }
        }
    }

    None
}

fn find_consecutive(rules: &Rules, grid: &Grid) -> Option<Deduction> {
    for pos in grid.positions().filter(|&p| grid.is_empty_at(p)) {
        for symbol in Symbol::ALL {
            if rules.completes_run(grid, pos, symbol) {
                return Some(Deduction {
                    pos,
                    value: symbol.opposite(),
                    rule: Rule::ConsecutivePrevention,
                    explanation: format!(
                        "Placing {} here would create three consecutive {}s",
                        symbol, symbol
                    ),
                    related: run_partners(grid, pos, symbol),
                });
            }
        }
    }
    None
}

/// The two filled cells that would form a run of three with `pos`.
fn run_partners(grid: &Grid, pos: Position, symbol: Symbol) -> Vec<Position> {
    let n = grid.size() as isize;
    let (r, c) = (pos.row as isize, pos.col as isize);
    let holds = |r: isize, c: isize| {
        r >= 0 && c >= 0 && r < n && c < n
            && grid.get(Position::new(r as usize, c as usize)) == Some(symbol)
    };
    let alignments = [
        [(0, -2), (0, -1)],
        [(0, -1), (0, 1)],
        [(0, 1), (0, 2)],
        [(-2, 0), (-1, 0)],
        [(-1, 0), (1, 0)],
        [(1, 0), (2, 0)],
    ];
    alignments
        .iter()
        .find(|pair| pair.iter().all(|&(dr, dc)| holds(r + dr, c + dc)))
        .map(|pair| {
            pair.iter()
                .map(|&(dr, dc)| Position::new((r + dr) as usize, (c + dc) as usize))
                .collect()
        })
        .unwrap_or_default()
}

fn find_link(rules: &Rules, grid: &Grid) -> Option<Deduction> {
    for link in rules.links() {
        let (a, b) = (link.first(), link.second());
        let (target, known, value) = match (grid.get(a), grid.get(b)) {
            (Some(v), None) => (b, a, v),
            (None, Some(v)) => (a, b, v),
            _ => continue,
        };
        let (rule, name) = match link.kind {
            LinkKind::Equal => (Rule::EqualConstraint, "equal"),
            LinkKind::Opposite => (Rule::OppositeConstraint, "opposite"),
        };
        let forced = link.kind.partner_of(value);
        return Some(Deduction {
            pos: target,
            value: forced,
            rule,
            explanation: format!(
                "Must be {} due to {} constraint with cell ({}, {})",
                forced, name, known.row, known.col
            ),
            related: vec![known],
        });
    }
    None
}

fn find_fallback(grid: &Grid, solution: &Grid) -> Option<Deduction> {
    let pos = grid.positions().find(|&p| grid.is_empty_at(p))?;
    Some(Deduction {
        pos,
        value: solution.get(pos)?,
        rule: Rule::AdvancedDeduction,
        explanation: "Determined through constraint propagation and logical deduction".to_string(),
        related: Vec::new(),
    })
}

// ==================== Detailed narration ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Primary,
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellHighlight {
    pub row: usize,
    pub col: usize,
    pub color: HighlightColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Row,
    Column,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHighlight {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub index: usize,
    pub color: HighlightColor,
}

/// Cells and lines a front end should highlight for a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualHints {
    pub highlighted_cells: Vec<CellHighlight>,
    pub highlighted_regions: Vec<RegionHighlight>,
    pub target_cell: CellHighlight,
}

/// A step with its rule title, long-form reasoning and display hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedStep {
    pub step_number: usize,
    pub row: usize,
    pub col: usize,
    pub value: Symbol,
    pub rule_applied: Rule,
    pub rule_title: String,
    pub explanation: String,
    pub detailed_explanation: String,
    pub hint: String,
    pub visual_hints: VisualHints,
}

impl DetailedStep {
    pub fn from_step(step: &ExplanationStep, size: usize) -> Self {
        Self {
            step_number: step.step_number,
            row: step.row,
            col: step.col,
            value: step.value,
            rule_applied: step.rule,
            rule_title: step.rule.title().to_string(),
            explanation: step.explanation.clone(),
            detailed_explanation: detailed_text(step, size / 2),
            hint: step.rule.tip().to_string(),
            visual_hints: visual_hints(step),
        }
    }
}

fn detailed_text(step: &ExplanationStep, half: usize) -> String {
    let value = step.value;
    let other = value.opposite();
    match step.rule {
        Rule::RowCount => format!(
            "Let's look at row {row}:\n\
             - Each row must have exactly {half} suns and {half} moons\n\
             - This row already has {half} {other}s\n\
             - Therefore, all remaining empty cells must be {value}s\n\
             - Cell ({row}, {col}) is empty, so it must be a {value}",
            row = step.row,
            col = step.col,
        ),
        Rule::ColumnCount => format!(
            "Let's look at column {col}:\n\
             - Each column must have exactly {half} suns and {half} moons\n\
             - This column already has {half} {other}s\n\
             - Therefore, all remaining empty cells must be {value}s\n\
             - Cell ({row}, {col}) is empty, so it must be a {value}",
            row = step.row,
            col = step.col,
        ),
        Rule::ConsecutivePrevention => format!(
            "Looking at position ({}, {}):\n\
             - No more than 2 consecutive symbols are allowed\n\
             - If we place a {other} here, it would create 3 consecutive {other}s\n\
             - Therefore, this cell must be a {value}",
            step.row, step.col,
        ),
        Rule::EqualConstraint => format!(
            "Equal Constraint (=):\n\
             - Two cells connected by '=' must have the same symbol\n{}",
            step.explanation
        ),
        Rule::OppositeConstraint => format!(
            "Opposite Constraint (×):\n\
             - Two cells connected by '×' must have opposite symbols\n{}",
            step.explanation
        ),
        Rule::AdvancedDeduction => step.explanation.clone(),
    }
}

fn visual_hints(step: &ExplanationStep) -> VisualHints {
    let highlight = |pos: &Position, color| CellHighlight {
        row: pos.row,
        col: pos.col,
        color,
    };
    let (cells, regions) = match step.rule {
        Rule::RowCount => (
            Vec::new(),
            vec![RegionHighlight {
                kind: RegionKind::Row,
                index: step.row,
                color: HighlightColor::Info,
            }],
        ),
        Rule::ColumnCount => (
            Vec::new(),
            vec![RegionHighlight {
                kind: RegionKind::Column,
                index: step.col,
                color: HighlightColor::Info,
            }],
        ),
        Rule::ConsecutivePrevention => (
            step.related
                .iter()
                .map(|p| highlight(p, HighlightColor::Warning))
                .collect(),
            Vec::new(),
        ),
        Rule::EqualConstraint | Rule::OppositeConstraint => (
            step.related
                .iter()
                .map(|p| highlight(p, HighlightColor::Success))
                .collect(),
            Vec::new(),
        ),
        Rule::AdvancedDeduction => (Vec::new(), Vec::new()),
    };
    VisualHints {
        highlighted_cells: cells,
        highlighted_regions: regions,
        target_cell: highlight(&step.position(), HighlightColor::Primary),
    }
}

// ==================== Summary ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleUsage {
    pub rule: Rule,
    pub title: String,
    pub count: usize,
    pub percentage: f64,
}

/// Whole-solution tallies and qualitative difficulty flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSummary {
    pub total_steps: usize,
    pub rules_used: Vec<RuleUsage>,
    pub difficulty_indicators: Vec<String>,
}

impl SolutionSummary {
    pub fn from_steps(steps: &[ExplanationStep]) -> Self {
        let counts = rule_counts(steps);
        let total = steps.len();

        let mut rules_used: Vec<RuleUsage> = counts
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&rule, &count)| RuleUsage {
                rule,
                title: rule.title().to_string(),
                count,
                percentage: count as f64 * 100.0 / total as f64,
            })
            .collect();
        rules_used.sort_by(|a, b| b.count.cmp(&a.count));

        let mut indicators = Vec::new();
        if counts[&Rule::AdvancedDeduction] > 2 {
            indicators.push("Required multiple advanced deductions".to_string());
        }
        if total > 25 {
            indicators.push("Long solution path required".to_string());
        }
        let link_steps = steps.iter().filter(|s| s.rule.is_link()).count();
        if link_steps as f64 > total as f64 * 0.3 {
            indicators.push("Heavy reliance on constraint rules".to_string());
        }

        Self {
            total_steps: total,
            rules_used,
            difficulty_indicators: indicators,
        }
    }
}

/// Step count per rule, with every rule present.
pub fn rule_counts(steps: &[ExplanationStep]) -> BTreeMap<Rule, usize> {
    let mut counts: BTreeMap<Rule, usize> = Rule::all().iter().map(|&r| (r, 0)).collect();
    for step in steps {
        *counts.entry(step.rule).or_insert(0) += 1;
    }
    counts
}

/// Output of the `explain` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub steps: Vec<DetailedStep>,
    pub summary: SolutionSummary,
}

impl Explanation {
    pub fn from_steps(steps: &[ExplanationStep], size: usize) -> Self {
        Self {
            steps: steps.iter().map(|s| DetailedStep::from_step(s, size)).collect(),
            summary: SolutionSummary::from_steps(steps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLVED: &str = "ABABAB BABABA ABABAB BABABA ABABAB BABABA";

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_row_saturation_first() {
        let solution = Grid::from_string(SOLVED).unwrap();
        let mut initial = solution.clone();
        initial.set(pos(0, 1), None);
        initial.set(pos(3, 0), None);

        let steps = explain_steps(&initial, &solution, &[]).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].position(), pos(0, 1));
        assert_eq!(steps[0].rule, Rule::RowCount);
        assert_eq!(steps[0].value, Symbol::Moon);
        assert_eq!(
            steps[0].explanation,
            "Row 0 already has 3 suns, so remaining cells must be moons"
        );
        assert_eq!(steps[1].step_number, 2);
        assert_eq!(apply_steps(&initial, &steps), solution);
    }

    #[test]
    fn test_column_saturation() {
        let solution = Grid::from_string(SOLVED).unwrap();
        let mut initial = solution.clone();
        for (r, c) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            initial.set(pos(r, c), None);
        }
        initial.set(pos(0, 2), None);
        initial.set(pos(0, 3), None);

        let steps = explain_steps(&initial, &solution, &[]).unwrap();
        assert_eq!(apply_steps(&initial, &steps), solution);
        assert!(steps.iter().any(|s| s.rule == Rule::ColumnCount));
    }

    #[test]
    fn test_consecutive_prevention() {
        let solution = Grid::from_string(
            "AABABB BBABAA AABABB BBABAA ABABAB BABABA",
        )
        .unwrap();
        let initial = Grid::from_string("AA.... ...... ...... ...... ...... ......").unwrap();

        let steps = explain_steps(&initial, &solution, &[]).unwrap();
        let first = &steps[0];
        assert_eq!(first.position(), pos(0, 2));
        assert_eq!(first.rule, Rule::ConsecutivePrevention);
        assert_eq!(first.value, Symbol::Moon);
        assert_eq!(first.related, vec![pos(0, 0), pos(0, 1)]);
        assert_eq!(
            first.explanation,
            "Placing sun here would create three consecutive suns"
        );
    }

    #[test]
    fn test_link_propagation() {
        let solution = Grid::from_string(SOLVED).unwrap();
        let links = vec![Link::opposite(pos(2, 2), pos(3, 2))];
        let initial = Grid::from_string("...... ...... ..A... ...... ...... ......").unwrap();

        let steps = explain_steps(&initial, &solution, &links).unwrap();
        let first = &steps[0];
        assert_eq!(first.position(), pos(3, 2));
        assert_eq!(first.rule, Rule::OppositeConstraint);
        assert_eq!(first.value, Symbol::Moon);
        assert_eq!(first.related, vec![pos(2, 2)]);
        assert_eq!(
            first.explanation,
            "Must be moon due to opposite constraint with cell (2, 2)"
        );
    }

    #[test]
    fn test_fallback_on_empty_grid() {
        let solution = Grid::from_string(SOLVED).unwrap();
        let steps = explain_steps(&Grid::empty(), &solution, &[]).unwrap();
        assert_eq!(steps[0].rule, Rule::AdvancedDeduction);
        assert_eq!(steps[0].position(), pos(0, 0));
        assert_eq!(steps.len(), 36);
        assert_eq!(apply_steps(&Grid::empty(), &steps), solution);
    }

    #[test]
    fn test_summary_indicators() {
        let solution = Grid::from_string(SOLVED).unwrap();
        let steps = explain_steps(&Grid::empty(), &solution, &[]).unwrap();
        let summary = SolutionSummary::from_steps(&steps);

        assert_eq!(summary.total_steps, 36);
        let total: usize = summary.rules_used.iter().map(|u| u.count).sum();
        assert_eq!(total, 36);
        let percent: f64 = summary.rules_used.iter().map(|u| u.percentage).sum();
        assert!((percent - 100.0).abs() < 1e-9);
        assert!(summary
            .difficulty_indicators
            .contains(&"Long solution path required".to_string()));
        assert!(summary
            .rules_used
            .windows(2)
            .all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_detailed_step() {
        let solution = Grid::from_string(SOLVED).unwrap();
        let links = vec![Link::equal(pos(0, 0), pos(0, 2))];
        let initial = Grid::from_string("A..... ...... ...... ...... ...... ......").unwrap();
        let steps = explain_steps(&initial, &solution, &links).unwrap();
        let detailed = DetailedStep::from_step(&steps[0], 6);

        assert_eq!(detailed.rule_applied, Rule::EqualConstraint);
        assert_eq!(detailed.rule_title, "Equal Constraint Rule");
        assert!(detailed.detailed_explanation.starts_with("Equal Constraint (=):"));
        assert_eq!(detailed.visual_hints.target_cell.row, 0);
        assert_eq!(detailed.visual_hints.target_cell.col, 2);
        assert_eq!(detailed.visual_hints.highlighted_cells.len(), 1);
    }

    #[test]
    fn test_step_wire_format() {
        let step = ExplanationStep {
            step_number: 1,
            row: 0,
            col: 3,
            value: Symbol::Moon,
            rule: Rule::RowCount,
            explanation: "x".to_string(),
            related: Vec::new(),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "step_number": 1, "row": 0, "col": 3, "value": "B",
                "rule_applied": "row_count", "explanation": "x"
            })
        );
    }
}
