//! Determinization of a handle-finding automaton into dense ACTION/GOTO matrices, the
//! compaction passes that shrink those matrices and the scanner's delta function, and the
//! versioned artifact that carries the compact tables to a runtime.
//!
//! The action encoding is authoritative here and everywhere downstream: cell `a` for state
//! `q` on terminal `t` means
//!
//! * `a == 0` — error (subject to the default-reduction and essential-error predicates);
//! * `0 < a < split_offset` — shift to state `a`;
//! * `a < 0` — reduce using rule `-1 - a`;
//! * `a >= split_offset` — consult split `a - split_offset`, whose members are themselves
//!   action codes of the above forms.

mod compaction;
mod determinize;
mod expansion;

pub use compaction::{
    compress_action_table, compress_goto_table, compress_parser, compress_scanner,
    find_column_equivalence, find_row_equivalence,
};
pub use determinize::{encode_reduce, tabulate};
pub use expansion::{
    ActionTableReader, BooleanFieldReader, CompactScannerReader, DisplacementReader,
    GotoTableReader, ReducePlaneReader, ScannerDeltaReader,
};

use crate::grammar::Grammar;
use crate::hfa::{Hfa, LookaheadState};
use crate::scanner::ScanRuleBinding;
use crate::TABLE_FORMAT_VERSION;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Unresolved inadequacies surfaced by a parsing style that refuses to proceed.
#[derive(Debug)]
pub struct ConflictError {
    /// `(state, lookahead, candidate rule ids)` per conflicted cell.
    pub conflicts: Vec<(usize, String, Vec<usize>)>,
}

impl Display for ConflictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grammar has {} unresolved conflict(s):", self.conflicts.len())?;
        for (q, lookahead, rule_ids) in &self.conflicts {
            writeln!(f, "  state {} on '{}': rules {:?}", q, lookahead, rule_ids)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConflictError {}

/// There are three main ways to deal with inadequacies (nondeterminism) remaining after the
/// precedence declarations have spoken:
///
/// 1. Pure: inadequacies are considered a grammar bug ([DeterministicStyle] with `strict`).
/// 2. Deterministic: resolve to shift, or to the earliest-defined rule, and report.
/// 3. Generalized: convert each inadequacy to a parser-split entry ([GeneralizedStyle]).
pub trait ParsingStyle {
    /// Called in all nondeterministic situations; returns the action code for the cell.
    fn decide_inadequacy(
        &mut self,
        q: usize,
        look_ahead: &str,
        shift: i32,
        rule_ids: &[usize],
        grammar: &Grammar,
    ) -> i32;

    /// Nothing, or the list of splits for use in nondeterministic parsing algorithms.
    fn any_splits(&mut self) -> Vec<Vec<i32>>;

    /// Give user feedback about any observed challenges; the pure style fails here.
    fn report(&mut self, hfa: &Hfa<LookaheadState>, grammar: &Grammar) -> Result<(), ConflictError>;
}

/// Shift-else-earliest-rule resolution; `strict` turns any conflict into a hard error.
pub struct DeterministicStyle {
    pub strict: bool,
    pub conflicts: BTreeMap<(usize, String), Vec<usize>>,
}

impl DeterministicStyle {
    pub fn new(strict: bool) -> Self {
        Self { strict, conflicts: BTreeMap::new() }
    }
}

impl ParsingStyle for DeterministicStyle {
    fn decide_inadequacy(
        &mut self,
        q: usize,
        look_ahead: &str,
        shift: i32,
        rule_ids: &[usize],
        _grammar: &Grammar,
    ) -> i32 {
        self.conflicts
            .entry((q, look_ahead.to_owned()))
            .or_default()
            .extend(rule_ids.iter().copied());
        if shift != 0 {
            shift
        } else {
            encode_reduce(*rule_ids.iter().min().expect("an inadequacy names at least one rule"))
        }
    }

    fn any_splits(&mut self) -> Vec<Vec<i32>> {
        Vec::new()
    }

    fn report(&mut self, hfa: &Hfa<LookaheadState>, grammar: &Grammar) -> Result<(), ConflictError> {
        for ((q, lookahead), rule_ids) in &self.conflicts {
            hfa.display_situation(grammar, *q, lookahead);
            if let Some(shift) = hfa.graph[*q].shift.get(lookahead) {
                println!("Do we shift into state {}?", shift);
            }
            for &r in rule_ids {
                println!("Do we reduce:  {}", grammar.rules[r]);
            }
        }
        if self.strict && !self.conflicts.is_empty() {
            return Err(ConflictError {
                conflicts: self
                    .conflicts
                    .iter()
                    .map(|((q, t), rule_ids)| (*q, t.clone(), rule_ids.clone()))
                    .collect(),
            });
        }
        Ok(())
    }
}

/// Allocates a split entry per inadequacy; a nondeterministic table just needs that one extra
/// list of lists. Candidate reductions are listed in increasing order of right-hand-side
/// length.
pub struct GeneralizedStyle {
    split_offset: usize,
    splits: Vec<Vec<i32>>,
}

impl GeneralizedStyle {
    /// `split_offset` is the action-code boundary above which codes refer to splits; pass the
    /// state count of the automaton being tabulated.
    pub fn new(split_offset: usize) -> Self {
        Self { split_offset, splits: Vec::new() }
    }
}

impl ParsingStyle for GeneralizedStyle {
    fn decide_inadequacy(
        &mut self,
        _q: usize,
        _look_ahead: &str,
        shift: i32,
        rule_ids: &[usize],
        grammar: &Grammar,
    ) -> i32 {
        let mut split = Vec::new();
        if shift != 0 {
            split.push(shift);
        }
        let mut candidates: Vec<usize> = rule_ids.to_vec();
        candidates.sort_by_key(|&r| grammar.rules[r].rhs.len());
        split.extend(candidates.into_iter().map(encode_reduce));
        let split_id = self.splits.len();
        self.splits.push(split);
        (self.split_offset + split_id) as i32
    }

    fn any_splits(&mut self) -> Vec<Vec<i32>> {
        std::mem::take(&mut self.splits)
    }

    fn report(&mut self, _hfa: &Hfa<LookaheadState>, _grammar: &Grammar) -> Result<(), ConflictError> {
        println!("{} non-deterministic situation(s) encountered.", self.splits.len());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One rule as the runtime sees it: which nonterminal it produces, how much stack it pops, and
/// how to synthesize its semantic value. A negative `constructor` picks the right-hand-side
/// element at that offset from the end; a positive one indexes the constructor table, with
/// `captures` holding the argument offsets (also from the end).
pub struct RuleEntry {
    pub lhs_index: usize,
    pub rhs_length: usize,
    pub constructor: i32,
    pub captures: Vec<i32>,
}

#[derive(Debug)]
/// The classic textbook view of a parse table: a pair of dense matrices for ACTION and GOTO,
/// along with everything the runtime needs to know about the reduction rules.
///
/// Perfectly reasonable as-is on a modern machine; the compaction passes exist because compact
/// tables fit in cache and travel well.
pub struct DenseTables {
    pub initial: BTreeMap<String, usize>,
    pub action_matrix: Vec<Vec<i32>>,
    pub goto_matrix: Vec<Vec<i32>>,
    pub essential_errors: BTreeSet<(usize, usize)>,
    pub terminals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub breadcrumbs: Vec<Option<String>>,
    pub rule_table: Vec<RuleEntry>,
    pub constructors: Vec<String>,
    pub rule_provenance: Vec<usize>,
    pub splits: Vec<Vec<i32>>,
    pub(crate) interactive: Vec<i32>,
}

impl DenseTables {
    pub fn get_action(&self, state_id: usize, terminal_id: usize) -> i32 {
        self.action_matrix[state_id][terminal_id]
    }

    pub fn get_goto(&self, state_id: usize, nonterminal_id: usize) -> i32 {
        self.goto_matrix[state_id][nonterminal_id]
    }

    pub fn get_rule(&self, rule_id: usize) -> &RuleEntry {
        &self.rule_table[rule_id]
    }

    /// Translate a terminal symbol to its column; unknown symbols map just past the end,
    /// guaranteed to trigger error processing.
    pub fn get_translation(&self, symbol: &str) -> usize {
        self.terminals.iter().position(|t| t == symbol).unwrap_or(self.terminals.len())
    }

    pub fn get_initial(&self, language: Option<&str>) -> usize {
        match language {
            None => 0,
            Some(name) => self.initial[name],
        }
    }

    pub fn get_breadcrumb(&self, state_id: usize) -> &str {
        self.breadcrumbs[state_id].as_deref().unwrap_or("")
    }

    /// The encoded reduction for states that may reduce eagerly without awaiting a fresh
    /// token, and zero for all others.
    pub fn interactive_step(&self, state_id: usize) -> i32 {
        self.interactive[state_id]
    }

    pub fn get_split_offset(&self) -> usize {
        self.action_matrix.len()
    }

    pub fn get_split(&self, split_id: usize) -> &[i32] {
        &self.splits[split_id]
    }
}

impl Display for DenseTables {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Action and Goto: ({} states)", self.action_matrix.len())?;
        writeln!(f, "terminals: {:?}", self.terminals)?;
        writeln!(f, "nonterminals: {:?}", self.nonterminals)?;
        for (q, (action, goto)) in self.action_matrix.iter().zip(&self.goto_matrix).enumerate() {
            writeln!(f, "{:>4} {:>10} {:?} | {:?}", q, self.get_breadcrumb(q), action, goto)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// The compact, serializable artifact.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A textbook displacement table: a simple kind of perfect hash. The only reliable check value
/// is the row number, since two distinct rows may share an offset.
pub struct DisplacementTable {
    pub offset: Vec<i32>,
    pub check: Vec<i32>,
    pub value: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The two-mode background plane of the scanner's delta function. For most states the most
/// common entry is the error transition, so `zero_index`/`zero_value` list only the exceptions
/// to that rule.
pub struct DeltaBackground {
    pub zero_index: Vec<usize>,
    pub zero_value: Vec<i32>,
    pub one: Vec<i32>,
    pub row_class: Vec<usize>,
    pub col_class: Vec<usize>,
    pub offset: Vec<i32>,
    pub check: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactDelta {
    pub exceptions: DisplacementTable,
    pub bg: DeltaBackground,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactAlphabet {
    pub bounds: Vec<i32>,
    pub classes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactDfa {
    pub delta: CompactDelta,
    /// condition name → `[mid-line state, beginning-of-line state]`.
    pub initial: BTreeMap<String, (usize, usize)>,
    #[serde(rename = "final")]
    pub final_states: Vec<usize>,
    pub rule: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactScanner {
    pub alphabet: CompactAlphabet,
    pub dfa: CompactDfa,
    pub action: Vec<ScanRuleBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The default-reduction plane with its error predicate: `d_reduce` per row, plus an
/// equivalence-classified boolean field telling which cells the default actually covers.
pub struct ReducePlane {
    pub d_reduce: Vec<i32>,
    pub row_class: Vec<usize>,
    pub col_class: Vec<usize>,
    pub offset: Vec<i32>,
    pub check: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactAction {
    pub reduce: ReducePlane,
    pub fallback: Vec<i32>,
    pub edits: DisplacementTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// `quotient[..mark]` is the single-value pull-out; beyond `mark` lies the packed residue
/// indexed by `row_index + col_index - mark`.
pub struct CompactGoto {
    pub row_index: Vec<usize>,
    pub col_index: Vec<usize>,
    pub quotient: Vec<i32>,
    pub mark: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactRules {
    pub rules: Vec<RuleEntry>,
    pub constructor: Vec<String>,
    pub line_number: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactParser {
    pub action: CompactAction,
    pub goto: CompactGoto,
    pub rule: CompactRules,
    pub terminals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub initial: BTreeMap<String, usize>,
    pub breadcrumbs: Vec<Option<String>>,
    #[serde(default)]
    pub splits: Vec<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The whole artifact a generator run leaves behind.
pub struct CompactTables {
    pub version: (u16, u16, u16),
    pub scanner: Option<CompactScanner>,
    pub parser: Option<CompactParser>,
}

#[derive(Debug)]
pub enum TablesError {
    /// The artifact's major version differs from ours.
    Version { found: (u16, u16, u16), expected: u16 },
    Syntax(String),
}

impl Display for TablesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TablesError::Version { found, expected } => write!(
                f,
                "Table artifact has version {}.{}.{}; this reader requires major {}.",
                found.0, found.1, found.2, expected
            ),
            TablesError::Syntax(message) => write!(f, "Malformed table artifact: {}", message),
        }
    }
}

impl std::error::Error for TablesError {}

impl CompactTables {
    pub fn new(scanner: Option<CompactScanner>, parser: Option<CompactParser>) -> Self {
        Self { version: TABLE_FORMAT_VERSION, scanner, parser }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("compact tables always serialize")
    }

    /// Parse an artifact, refusing a major-version mismatch.
    pub fn from_json(text: &str) -> Result<Self, TablesError> {
        let tables: CompactTables =
            serde_json::from_str(text).map_err(|err| TablesError::Syntax(err.to_string()))?;
        if tables.version.0 != TABLE_FORMAT_VERSION.0 {
            return Err(TablesError::Version {
                found: tables.version,
                expected: TABLE_FORMAT_VERSION.0,
            });
        }
        Ok(tables)
    }
}
