//! Mechanisms for working with regular languages: an AST for regular expressions, the
//! nondeterministic automaton it encodes into, and the deterministic automaton the scanner
//! tables are computed from.
//!
//! The pipeline is [RegexAst] → [Nfa] (Thompson-style, rank-annotated) →
//! [Dfa] by rank-aware subset construction → [Dfa::minimize_states] →
//! [Dfa::minimize_alphabet].
//!
//! # Example
//! ```
//! use lang_tc::regex::{Nfa, RegexAst};
//! use lang_tc::charset;
//!
//! // ab*c as a rule of rank 0 in the default condition.
//! let expr = RegexAst::seq(
//!     RegexAst::class(charset::singleton('a' as i32)),
//!     RegexAst::seq(
//!         RegexAst::star(RegexAst::class(charset::singleton('b' as i32))),
//!         RegexAst::class(charset::singleton('c' as i32)),
//!     ),
//! );
//! let mut nfa = Nfa::new();
//! let (mid, bol) = nfa.condition("INITIAL");
//! let src = nfa.new_node(0);
//! let dst = nfa.new_node(0);
//! nfa.link_epsilon(mid, src);
//! nfa.link_epsilon(bol, src);
//! nfa.mark_final(dst, 0);
//! expr.encode(&mut nfa, src, dst, 0);
//! let dfa = nfa.subset_construction().minimize_states().minimize_alphabet();
//! let (start, _) = dfa.condition("INITIAL").unwrap();
//! let mut q = start as i32;
//! for c in "abbbc".chars() {
//!     q = dfa.transition(q, c as i32);
//! }
//! assert_eq!(dfa.accept(q), Some(0));
//! ```

mod display;
mod encode;
mod minimize;
mod subset;

#[cfg(test)]
mod __tests__;

use crate::charset::CharClass;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Abstract syntax of a regular expression.
///
/// `Counted` bounds repetition: `Counted(x, m, Some(n))` matches m through n copies and
/// `Counted(x, m, None)` matches m or more. The other operators mean what they always mean;
/// `Hook` is the `?` operator.
pub enum RegexAst {
    CharClass(CharClass),
    Alternation(Box<RegexAst>, Box<RegexAst>),
    Sequence(Box<RegexAst>, Box<RegexAst>),
    Star(Box<RegexAst>),
    Hook(Box<RegexAst>),
    Plus(Box<RegexAst>),
    Counted(Box<RegexAst>, usize, Option<usize>),
}

impl RegexAst {
    pub fn class(cls: CharClass) -> Self {
        RegexAst::CharClass(cls)
    }
    pub fn alt(a: RegexAst, b: RegexAst) -> Self {
        RegexAst::Alternation(Box::new(a), Box::new(b))
    }
    pub fn seq(a: RegexAst, b: RegexAst) -> Self {
        RegexAst::Sequence(Box::new(a), Box::new(b))
    }
    pub fn star(sub: RegexAst) -> Self {
        RegexAst::Star(Box::new(sub))
    }
    pub fn hook(sub: RegexAst) -> Self {
        RegexAst::Hook(Box::new(sub))
    }
    pub fn plus(sub: RegexAst) -> Self {
        RegexAst::Plus(Box::new(sub))
    }
    pub fn counted(sub: RegexAst, m: usize, n: Option<usize>) -> Self {
        RegexAst::Counted(Box::new(sub), m, n)
    }

    /// A sequence of singleton classes spelling out `text`. Panics on an empty string, which
    /// would not denote a pattern at all.
    pub fn literal(text: &str) -> Self {
        let mut chars = text.chars();
        let head = chars.next().expect("literal pattern must not be empty");
        let mut expr = RegexAst::class(crate::charset::singleton(head as i32));
        for c in chars {
            expr = RegexAst::seq(expr, RegexAst::class(crate::charset::singleton(c as i32)));
        }
        expr
    }
}

/// Nondeterministic finite automaton under construction.
///
/// Nodes carry their ε-successor set, labelled edges, and a rule-priority rank. The `initial`
/// table maps each scan condition to a pair of entry nodes: one for mid-line starts and one
/// for beginning-of-line starts.
pub struct Nfa {
    pub states: Vec<NfaNode>,
    pub initial: BTreeMap<String, (usize, usize)>,
    pub finals: BTreeMap<usize, usize>,
    // There is at least an "end-of-file" marker bound, which is distinct from all else.
    pub all_bounds: BTreeSet<i32>,
}

#[derive(Debug, Clone)]
pub struct NfaNode {
    pub edges: Vec<NfaEdge>,
    pub epsilons: BTreeSet<usize>,
    pub rank: i32,
}

#[derive(Debug, Clone)]
pub struct NfaEdge {
    pub label: CharClass,
    pub target: usize,
}

impl Nfa {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            initial: BTreeMap::new(),
            finals: BTreeMap::new(),
            all_bounds: [0].into_iter().collect(),
        }
    }

    pub fn new_node(&mut self, rank: i32) -> usize {
        let id = self.states.len();
        self.states.push(NfaNode { edges: Vec::new(), epsilons: BTreeSet::new(), rank });
        id
    }

    /// The (mid-line, beginning-of-line) entry pair for a scan condition, created on first use.
    pub fn condition(&mut self, name: &str) -> (usize, usize) {
        if !self.initial.contains_key(name) {
            let pair = (self.new_node(0), self.new_node(0));
            self.initial.insert(name.to_owned(), pair);
        }
        self.initial[name]
    }

    pub fn link(&mut self, src: usize, dst: usize, label: CharClass) {
        self.all_bounds.extend(label.iter().copied());
        self.states[src].edges.push(NfaEdge { label, target: dst });
    }

    pub fn link_epsilon(&mut self, src: usize, dst: usize) {
        self.states[src].epsilons.insert(dst);
    }

    /// Make it as if all the rules in `included_condition` are also defined in
    /// `main_condition`, and in the same relative order. Both conditions must already exist.
    pub fn link_condition(&mut self, main_condition: &str, included_condition: &str) {
        let main = self.initial[main_condition];
        let included = self.initial[included_condition];
        self.link_epsilon(main.0, included.0);
        self.link_epsilon(main.1, included.1);
    }

    pub fn mark_final(&mut self, node: usize, rule_id: usize) {
        self.finals.insert(node, rule_id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Maps every codepoint to a numbered character class as known to a deterministic automaton.
///
/// The `Simple` form is the raw bound list produced by subset construction; `Meta` composes it
/// with a per-class identification produced by alphabet minimization.
pub enum Classifier {
    Simple { bounds: Vec<i32> },
    Meta { bounds: Vec<i32>, classes: Vec<usize> },
}

impl Classifier {
    pub fn classify(&self, codepoint: i32) -> usize {
        match self {
            Classifier::Simple { bounds } => bounds.partition_point(|&b| b <= codepoint),
            Classifier::Meta { bounds, classes } => classes[bounds.partition_point(|&b| b <= codepoint)],
        }
    }

    pub fn cardinality(&self) -> usize {
        match self {
            Classifier::Simple { bounds } => 1 + bounds.len(),
            Classifier::Meta { classes, .. } => classes.iter().max().map_or(0, |&c| c + 1),
        }
    }
}

/// Deterministic finite automaton: a classifier over the input alphabet, a dense transition
/// matrix, a final-state → rule-id mapping, and a per-condition pair of initial states.
///
/// Invariant: every row has width equal to the classifier's cardinality.
pub struct Dfa {
    pub alphabet: Classifier,
    pub initial: BTreeMap<String, (usize, usize)>,
    pub finals: BTreeMap<usize, usize>,
    pub states: Vec<Vec<i32>>,
}

impl Dfa {
    pub fn new(alphabet: Classifier) -> Self {
        Self { alphabet, initial: BTreeMap::new(), finals: BTreeMap::new(), states: Vec::new() }
    }

    pub fn jam_state(&self) -> i32 {
        -1
    }

    pub fn width(&self) -> usize {
        self.alphabet.cardinality()
    }

    pub fn append_state(&mut self, row: Vec<i32>) -> usize {
        debug_assert_eq!(row.len(), self.width());
        let id = self.states.len();
        self.states.push(row);
        id
    }

    /// The (mid-line, beginning-of-line) initial pair for a named scan condition.
    pub fn condition(&self, condition_name: &str) -> Option<(usize, usize)> {
        self.initial.get(condition_name).copied()
    }

    /// One step of the automaton; a negative state is the jam state and stays jammed.
    pub fn transition(&self, state: i32, codepoint: i32) -> i32 {
        if state < 0 {
            self.jam_state()
        } else {
            self.states[state as usize][self.alphabet.classify(codepoint)]
        }
    }

    /// The associated rule id if this state is final.
    pub fn accept(&self, state: i32) -> Option<usize> {
        if state < 0 {
            None
        } else {
            self.finals.get(&(state as usize)).copied()
        }
    }
}
