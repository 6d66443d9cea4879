//! Handle-finding automata: the parse automata whose states track where rule recognition may
//! complete, in the several strengths of the LR family.
//!
//! Every construction here returns a (possibly nondeterministic) [Hfa] which properly
//! represents any remaining nondeterminism; transmuting one into a fully deterministic table
//! is the [tables](crate::tables) module's job.
//!
//! * [lr0_construction] — the functional foundation for all the rest, with unit-rule elision.
//! * [lalr_construction] — LR(0) plus follow sets found by an edge-condensed fixed point.
//! * [canonical_lr1] — Knuth's maximal construction, for reference and for grammars that
//!   truly need it.
//! * [minimal_lr1] — a hybrid that splits LALR states only where genuine LR(1) inadequacies
//!   remain.
//!
//! The [Hfa::trial_parse] routine exercises these constructions by counting the distinct ways
//! an automaton recognizes a sentence; it exists for the test suite and for diagnostics, not
//! as a production parser.

mod items;
mod lalr;
mod lr0;
mod lr1;
mod reachable;

pub use items::ParseItemMap;
pub use lalr::{find_lalr_sets, lalr_construction};
pub use lr0::{lr0_construction, Lr0Build};
pub use lr1::{canonical_lr1, find_conflicts, minimal_lr1, ConflictData};
pub(crate) use reachable::reachable;

use crate::grammar::Grammar;
use crate::util::TraversalLedger;
use crate::END_OF_TOKENS;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The LR(0) construction completely ignores look-ahead for reduce rules: a set of possible
/// rules is enough for a nondeterministic table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lr0State {
    pub shift: BTreeMap<String, usize>,
    pub reduce: Vec<usize>,
}

/// Here the possible reductions are keyed to look-ahead tokens from the follow set of that
/// reduction, however derived. An *empty* rule list is the sentinel for an essential
/// non-association error: the cell must stay an error no matter what compaction does later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookaheadState {
    pub shift: BTreeMap<String, usize>,
    pub reduce: BTreeMap<String, Vec<usize>>,
}

/// What the generic operations need of a state, regardless of construction strength.
pub trait HfaState {
    fn shift_to(&self, symbol: &str) -> Option<usize>;
    fn reductions_before(&self, lexeme: &str) -> &[usize];
    fn successors(&self) -> Vec<usize>;
}

impl HfaState for Lr0State {
    fn shift_to(&self, symbol: &str) -> Option<usize> {
        self.shift.get(symbol).copied()
    }
    fn reductions_before(&self, _lexeme: &str) -> &[usize] {
        &self.reduce
    }
    fn successors(&self) -> Vec<usize> {
        self.shift.values().copied().collect()
    }
}

impl HfaState for LookaheadState {
    fn shift_to(&self, symbol: &str) -> Option<usize> {
        self.shift.get(symbol).copied()
    }
    fn reductions_before(&self, lexeme: &str) -> &[usize] {
        self.reduce.get(lexeme).map(Vec::as_slice).unwrap_or(&[])
    }
    fn successors(&self) -> Vec<usize> {
        self.shift.values().copied().collect()
    }
}

/// A handle-finding automaton.
///
/// `initial` and `accept` hold one state id per start symbol of the grammar. The ledger is the
/// breadth-first traversal record: earliest predecessor and breadcrumb symbol per state, which
/// yields the shortest symbol path to any state for diagnostics.
pub struct Hfa<S> {
    pub graph: Vec<S>,
    pub initial: Vec<usize>,
    pub accept: Vec<usize>,
    pub ledger: TraversalLedger,
}

struct StackCell {
    state: usize,
    prior: Option<Rc<StackCell>>,
}

impl<S: HfaState> Hfa<S> {
    /// Starting in state `q`, follow the shifts for `symbols` and return the resulting state.
    pub fn traverse<'a>(&self, q: usize, symbols: impl IntoIterator<Item = &'a String>) -> usize {
        let mut q = q;
        for s in symbols {
            q = self.graph[q].shift_to(s).expect("traverse must follow existing shifts");
        }
        q
    }

    /// Used for diagnostic displays: how might one get to state `q`, in symbols, and what
    /// would that parser situation look like?
    pub fn display_situation(&self, grammar: &Grammar, q: usize, lookahead: &str) {
        let path = self.ledger.shortest_path_to(q);
        let language_index =
            self.initial.iter().position(|&init| Some(&init) == path.first()).unwrap_or(0);
        println!("==============");
        println!("In language '{}', consider:", grammar.start[language_index]);
        let symbols: Vec<&str> =
            path[1..].iter().filter_map(|&i| self.ledger.breadcrumbs[i].as_deref()).collect();
        println!("\t{} \u{25CF} {}", symbols.join(" "), lookahead);
    }

    /// Make a file suitable for the `dot` application from the Graphviz package.
    pub fn make_dot_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        use std::io::Write;
        let mut fh = std::fs::File::create(path)?;
        writeln!(fh, "digraph {{")?;
        for q in 0..self.graph.len() {
            let mut symbol = self.ledger.breadcrumbs[q].clone().unwrap_or_default();
            symbol = symbol.replace('"', "\\\"");
            if symbol.ends_with('\\') {
                symbol.push(' ');
            }
            writeln!(fh, "{} [label=\"{}: {}\"]", q, q, symbol)?;
            for target in self.graph[q].successors() {
                writeln!(fh, "\t{} -> {}", q, target)?;
            }
        }
        writeln!(fh, "}}")
    }

    fn reduce_stack(
        &self,
        grammar: &Grammar,
        cell: &Rc<StackCell>,
        rule_id: usize,
    ) -> Rc<StackCell> {
        // To perform a reduction, roll the stack to before the RHS and then shift the LHS.
        let rule = &grammar.rules[rule_id];
        let mut base = cell.clone();
        for _ in 0..rule.rhs.len() {
            let prior = base.prior.clone().expect("parse stack cannot roll below its root");
            base = prior;
        }
        let next = self.graph[base.state]
            .shift_to(&rule.lhs)
            .expect("a discovered reduction always has a goto");
        Rc::new(StackCell { state: next, prior: Some(base) })
    }

    /// A super-simplistic nondeterministic recognizer: a lock-step parallel simulation with a
    /// cactus stack of viable states. It explores every possible parse, so it returns the
    /// number of distinct successful derivations — or an error if the sentence is not in the
    /// language. It will diverge on an infinitely-ambiguous situation, which validation
    /// refuses up front anyway.
    pub fn trial_parse<'a>(
        &self,
        grammar: &Grammar,
        sentence: impl IntoIterator<Item = &'a str>,
        language_index: usize,
    ) -> Result<usize, String> {
        let initial = self.initial[language_index];
        let accept = self.accept[language_index];

        let mut alive: Vec<Rc<StackCell>> =
            vec![Rc::new(StackCell { state: initial, prior: None })];
        for lexeme in sentence {
            let mut next: Vec<Rc<StackCell>> = Vec::new();
            let mut i = 0;
            while i < alive.len() {
                let cell = alive[i].clone();
                let state = &self.graph[cell.state];
                if let Some(target) = state.shift_to(lexeme) {
                    next.push(Rc::new(StackCell { state: target, prior: Some(cell.clone()) }));
                }
                for &rule_id in state.reductions_before(lexeme) {
                    alive.push(self.reduce_stack(grammar, &cell, rule_id));
                }
                i += 1;
            }
            alive = next;
            if alive.is_empty() {
                return Err(format!("Parser died midway at '{}': ungrammatical.", lexeme));
            }
        }
        let mut count = 0;
        let mut i = 0;
        while i < alive.len() {
            let cell = alive[i].clone();
            if cell.state == accept {
                count += 1;
            }
            for &rule_id in self.graph[cell.state].reductions_before(END_OF_TOKENS) {
                alive.push(self.reduce_stack(grammar, &cell, rule_id));
            }
            i += 1;
        }
        if count == 0 {
            Err("Parser recognized a viable prefix, but not a complete sentence.".to_owned())
        } else {
            Ok(count)
        }
    }
}

#[cfg(test)]
mod __tests__;
