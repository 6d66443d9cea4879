//! Hook regular expression patterns up to scan conditions, ranks, and action bindings.
//!
//! The [ScannerBuilder] collects rules the way a scanner definition names them: a pattern,
//! which scan condition(s) it lives in, whether it applies mid-line or only at the beginning of
//! a line, an optional trailing context, a priority rank, and the symbolic message the runtime
//! driver will bind to a callable. Out the back comes the rank-annotated [Nfa] and, on demand,
//! the minimized [Dfa] plus the per-rule bindings the compact tables carry.

use crate::regex::{Dfa, Nfa, RegexAst};
use crate::{Log, DEFAULT_CONDITION};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

/// Which line positions a rule applies at: `(mid-line, beginning-of-line)`.
pub type BolPair = (bool, bool);

/// The unanchored default.
pub const ANYWHERE: BolPair = (true, true);
/// A `^`-anchored rule: only at the beginning of a line.
pub const ONLY_AT_BOL: BolPair = (false, true);
/// The rare inverse anchor: anywhere except the beginning of a line.
pub const NOT_AT_BOL: BolPair = (true, false);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// What the runtime needs to know about one scan rule beyond the automaton itself.
///
/// `right_context` encodes trailing context: a negative number of characters to chop from the
/// end of the match (fixed trail), a positive number of characters to keep (fixed stem), or
/// `None` when the rule has no trailing context.
pub struct ScanRuleBinding {
    pub right_context: Option<i32>,
    pub message: String,
    pub line_number: usize,
}

/// One rule on its way into the builder.
pub struct RuleSpec<'a> {
    expression: &'a RegexAst,
    message: &'a str,
    bol: BolPair,
    conditions: Vec<&'a str>,
    trail: Option<&'a RegexAst>,
    rank: i32,
    line_number: usize,
}

impl<'a> RuleSpec<'a> {
    pub fn new(expression: &'a RegexAst, message: &'a str) -> Self {
        Self {
            expression,
            message,
            bol: ANYWHERE,
            conditions: Vec::new(),
            trail: None,
            rank: 0,
            line_number: 0,
        }
    }
    pub fn bol(mut self, bol: BolPair) -> Self {
        self.bol = bol;
        self
    }
    pub fn condition(mut self, condition: &'a str) -> Self {
        self.conditions.push(condition);
        self
    }
    pub fn trailing_context(mut self, trail: &'a RegexAst) -> Self {
        self.trail = Some(trail);
        self
    }
    pub fn rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }
    pub fn line(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }
}

/// Accumulates scan rules and produces the finite automaton plus rule bindings.
///
/// # Example
/// ```
/// use lang_tc::charset;
/// use lang_tc::regex::RegexAst;
/// use lang_tc::scanner::{RuleSpec, ScannerBuilder};
///
/// let word = RegexAst::plus(RegexAst::class(charset::NAMED_CLASSES["word"].clone()));
/// let space = RegexAst::plus(RegexAst::class(charset::NAMED_CLASSES["space"].clone()));
/// let mut builder = ScannerBuilder::new();
/// builder.install_rule(RuleSpec::new(&word, "word").line(1)).unwrap();
/// builder.install_rule(RuleSpec::new(&space, "ignore").line(2)).unwrap();
/// let dfa = builder.dfa();
/// let (mid, _) = dfa.condition(lang_tc::DEFAULT_CONDITION).unwrap();
/// let q = "hello".chars().fold(mid as i32, |q, c| dfa.transition(q, c as i32));
/// assert_eq!(dfa.accept(q), Some(0));
/// ```
pub struct ScannerBuilder {
    nfa: Nfa,
    bindings: Vec<ScanRuleBinding>,
    minimize: bool,
    log: OnceCell<Log<&'static str>>,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self { nfa: Nfa::new(), bindings: Vec::new(), minimize: true, log: OnceCell::new() }
    }

    /// Skip state/alphabet minimization in `dfa()`; mostly of interest to tests and debugging.
    pub fn without_minimization(mut self) -> Self {
        self.minimize = false;
        self
    }

    /// Set a log label to debug the construction.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log.set(log).map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Install one rule and return its rule id (the order of installation).
    ///
    /// Trailing context is analyzed here: a fixed-width trail is encoded as a negative chop, a
    /// variable trail behind a fixed-width stem as a positive keep, and a pattern with both
    /// parts variable is refused.
    pub fn install_rule(&mut self, spec: RuleSpec) -> Result<usize, String> {
        let (expression, right_context) = match spec.trail {
            None => (spec.expression.clone(), None),
            Some(trail) => {
                let stem = spec.expression.fixed_length();
                let context = match (trail.fixed_length(), stem) {
                    (Some(t), _) if t > 0 => -(t as i32),
                    (_, Some(s)) if s > 0 => s as i32,
                    _ => {
                        return Err(format!(
                            "Rule '{}': variable stem and variable trailing context in the same pattern are not presently supported.",
                            spec.message
                        ))
                    }
                };
                (RegexAst::seq(spec.expression.clone(), trail.clone()), Some(context))
            }
        };

        let rule_id = self.bindings.len();
        self.bindings.push(ScanRuleBinding {
            right_context,
            message: spec.message.to_owned(),
            line_number: spec.line_number,
        });

        let src = self.nfa.new_node(spec.rank);
        let dst = self.nfa.new_node(spec.rank);
        let conditions: Vec<&str> =
            if spec.conditions.is_empty() { vec![DEFAULT_CONDITION] } else { spec.conditions };
        for condition in conditions {
            let (mid, bol) = self.nfa.condition(condition);
            if spec.bol.0 {
                self.nfa.link_epsilon(mid, src);
            }
            if spec.bol.1 {
                self.nfa.link_epsilon(bol, src);
            }
        }
        self.nfa.mark_final(dst, rule_id);
        expression.encode(&mut self.nfa, src, dst, spec.rank);

        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Verbose(()).order() {
                println!("[{}] installed rule {} '{}'", log, rule_id, spec.message);
            }
        }
        Ok(rule_id)
    }

    /// Make every rule of `included` also answer in condition `main`, in the same relative
    /// order.
    pub fn include(&mut self, main: &str, included: &str) {
        self.nfa.condition(main);
        self.nfa.condition(included);
        self.nfa.link_condition(main, included);
    }

    pub fn bindings(&self) -> &[ScanRuleBinding] {
        &self.bindings
    }

    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    /// Determinize, then (by default) minimize states and the input alphabet.
    pub fn dfa(&self) -> Dfa {
        let dfa = self.nfa.subset_construction();
        let dfa = if self.minimize { dfa.minimize_states().minimize_alphabet() } else { dfa };
        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Default(()).order() {
                let (states, width, occupied) = dfa.stats();
                println!(
                    "[{}] DFA has {} states over {} classes, {} live cells",
                    log, states, width, occupied
                );
            }
        }
        dfa
    }
}
