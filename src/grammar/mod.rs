//! Attributed context-free grammars with operator-precedence and associativity declarations.
//!
//! This object follows a builder pattern: you construct an empty [Grammar], feed it a bunch of
//! declarations, and then start calculating based on the completed grammar. Several start
//! symbols may share one definition; a single set of tables (by choice of initial state) then
//! parses different languages while sharing common specification elements.
//!
//! Validation reports every fault through a pluggable [FaultHandler]: the default
//! [StrictFaultHandler] fails on the first fault, while [ReportingFaultHandler] collects and
//! continues.
//!
//! # Example
//! ```
//! use lang_tc::grammar::{Grammar, ReportingFaultHandler, Rule, RuleAction};
//!
//! let mut grammar = Grammar::new();
//! grammar.add_start("S");
//! // S -> x S is ill-founded: there's always one more S.
//! grammar.add_rule(Rule::new("S", &["x", "S"], RuleAction::Pick(1), 1)).unwrap();
//! let mut handler = ReportingFaultHandler::new();
//! grammar.validate(&mut handler).unwrap();
//! assert_eq!(handler.faults.len(), 1);
//! ```

mod faults;
mod precedence;
mod validate;

pub use faults::{Fault, FaultHandler, ReportingFaultHandler, StrictFaultHandler};
pub use precedence::OperatorPrecedence;

use once_cell::unsync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Direction of an associativity declaration. `Bogus` marks a precedence-only pseudo-terminal
/// which must never appear on any right-hand side.
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
    Bogus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What to do for attribute synthesis when recognizing a rule.
///
/// * `Pick(i)` names the significant right-hand-side index of a renaming or bracketing rule.
/// * `Message(name, indices)` carries an ostensible message and the right-hand-side indices
///   (zero-indexed from the left) from which to gather its arguments. Messages are not
///   interpreted here: a runtime-side resolver binds them to concrete callables.
pub enum RuleAction {
    Pick(usize),
    Message(String, Vec<usize>),
}

impl RuleAction {
    pub fn message(name: &str, indices: &[usize]) -> Self {
        RuleAction::Message(name.to_owned(), indices.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Arbitrary plain-jane BNF rule.
///
/// `prec_sym` optionally pins the rule's precedence to a declared symbol; otherwise precedence
/// is inferred from the first right-hand-side terminal that has any. `provenance` is typically
/// a source line number and only matters for reporting.
///
/// Unit/renaming productions are recognized and treated specially: the parse tables will
/// generally optimize such rules to a zero-cost abstraction, bypassing pointless extra stack
/// activity and leaving out needless extra states.
pub struct Rule {
    pub lhs: String,
    pub rhs: Vec<String>,
    pub prec_sym: Option<String>,
    pub action: RuleAction,
    pub provenance: usize,
}

impl Rule {
    pub fn new(lhs: &str, rhs: &[&str], action: RuleAction, provenance: usize) -> Self {
        Self {
            lhs: lhs.to_owned(),
            rhs: rhs.iter().map(|s| s.to_string()).collect(),
            prec_sym: None,
            action,
            provenance,
        }
    }

    pub fn with_prec_sym(mut self, prec_sym: &str) -> Self {
        self.prec_sym = Some(prec_sym.to_owned());
        self
    }

    /// A unit rule whose action passes its only symbol through unchanged.
    pub fn is_rename(&self) -> bool {
        self.rhs.len() == 1 && self.action == RuleAction::Pick(0)
    }

    /// The rule with a marker at `position`, for diagnostics.
    pub fn as_dotted(&self, position: usize) -> String {
        let mut rhs: Vec<&str> = self.rhs.iter().map(String::as_str).collect();
        rhs.insert(position.min(rhs.len()), "\u{25CF}");
        format!("{} -> {}", self.lhs, rhs.join(" "))
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs.join(" "))
    }
}

/// Attributed context-free grammar with operator-precedence support.
pub struct Grammar {
    pub symbols: BTreeSet<String>,
    pub rules: Vec<Rule>,
    pub start: Vec<String>,
    pub symbol_rule_ids: BTreeMap<String, Vec<usize>>,
    pub ops: OperatorPrecedence,
    // A reverse mapping from right-hand side symbols to rule ids makes various algorithms
    // easier and faster.
    pub mentions: BTreeMap<String, Vec<usize>>,
    pub(crate) nullable_cache: OnceCell<BTreeSet<String>>,
    pub(crate) first_cache: OnceCell<BTreeMap<String, BTreeSet<String>>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            symbols: BTreeSet::new(),
            rules: Vec::new(),
            start: Vec::new(),
            symbol_rule_ids: BTreeMap::new(),
            ops: OperatorPrecedence::new(),
            mentions: BTreeMap::new(),
            nullable_cache: OnceCell::new(),
            first_cache: OnceCell::new(),
        }
    }

    /// The start symbol(s) may be declared asynchronously to the rules.
    pub fn add_start(&mut self, symbol: &str) {
        self.start.push(symbol.to_owned());
    }

    /// Your basic mechanism to add BNF rules; responsible for the internal accounting.
    /// Refuses a rule whose action refers outside its own right-hand side.
    pub fn add_rule(&mut self, rule: Rule) -> Result<usize, String> {
        let arity = rule.rhs.len();
        match &rule.action {
            RuleAction::Pick(p) => {
                if *p >= arity {
                    return Err(format!(
                        "Rule '{}' picks index {} beyond its right-hand side.",
                        rule, p
                    ));
                }
            }
            RuleAction::Message(_, indices) => {
                if indices.iter().any(|&p| p >= arity) {
                    return Err(format!(
                        "Rule '{}' captures an index beyond its right-hand side.",
                        rule
                    ));
                }
            }
        }
        self.symbols.insert(rule.lhs.clone());
        self.symbols.extend(rule.rhs.iter().cloned());
        let rule_id = self.rules.len();
        self.symbol_rule_ids.entry(rule.lhs.clone()).or_default().push(rule_id);
        for symbol in &rule.rhs {
            self.mentions.entry(symbol.clone()).or_default().push(rule_id);
        }
        self.rules.push(rule);
        Ok(rule_id)
    }

    /// Declare one associativity level; precedence level equals declaration order.
    pub fn assoc(&mut self, direction: Assoc, symbols: &[&str], provenance: usize) {
        self.ops.assoc(direction, symbols, provenance);
    }

    /// Of all symbols mentioned, those without production rules are apparently terminal.
    pub fn apparent_terminals(&self) -> BTreeSet<String> {
        self.symbols
            .iter()
            .filter(|s| !self.symbol_rule_ids.contains_key(*s))
            .cloned()
            .collect()
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.symbol_rule_ids.contains_key(symbol)
    }

    /// The range of augmented-rule indices corresponding to the list of start symbols.
    ///
    /// The LR algorithms are normally explained with a special "accept" rule per start symbol.
    /// That accept non-terminal ought to be imaginary: it never appears on the right, nobody
    /// reduces it, and it deserves no column in the GOTO table. So the augmented rules exist
    /// only as this index range beyond the ordinary rules.
    pub fn initial(&self) -> std::ops::Range<usize> {
        let first = self.rules.len();
        first..first + self.start.len()
    }

    pub fn decide_shift_reduce(&self, symbol: &str, rule_id: usize) -> Option<Assoc> {
        self.ops.decide_shift_reduce(symbol, &self.rules[rule_id])
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "{:>4}  {}", i, rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod __tests__;
