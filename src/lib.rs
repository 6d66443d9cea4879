//! Language table compiler (lang_tc) is a library to compile lexical grammars and context-free
//! grammars into compact, table-driven recognizers suitable for execution by a generic runtime.
//!
//! # Overview
//! Parsers for real languages are often generated rather than written by hand, because a grammar
//! is easier to maintain than a wall of recursive procedures. This library is the *generator* half
//! of that bargain: it takes a regular-expression AST with scan conditions, trailing context and
//! rule ranks on one side, and an attributed context-free grammar with operator precedence on the
//! other side, and computes the finite automata, handle-finding automata, and compacted tables
//! that a small table-driven runtime can execute.
//!
//! # Design
//!
//! The crate is a pipeline with five stages:
//!
//! * [util] — graph plumbing shared by everything else: breadth-first traversal with canonical
//!   keys, transitive closure, strongly-connected components, equivalence classification, and
//!   first-fit-decreasing displacement packing.
//! * [regex] — NFA construction from a regex AST, rank-aware subset construction, and DFA
//!   minimization of both states and input alphabet.
//! * [grammar] — context-free grammar with precedence/associativity declarations and a battery
//!   of validation checks reported through a pluggable [FaultHandler](grammar::FaultHandler).
//! * [hfa] — the LR family of handle-finding automaton constructions: LR(0) with unit-rule
//!   elision, LALR(1) by an edge-condensed fixed point, canonical LR(1), and a minimal LR(1)
//!   which splits LALR states only where genuine inadequacies remain.
//! * [tables] — determinization into dense ACTION/GOTO matrices under a chosen
//!   [ParsingStyle](tables::ParsingStyle), followed by sparse-matrix compaction and a compact
//!   serialized artifact with readers to match.
//!
//! # Example
//!
//! Following is a small arithmetic grammar compiled down to deterministic parse tables.
//! ```
//! use lang_tc::grammar::{Assoc, Grammar, Rule, RuleAction, StrictFaultHandler};
//! use lang_tc::hfa::minimal_lr1;
//! use lang_tc::tables::{tabulate, DeterministicStyle};
//!
//! let mut grammar = Grammar::new();
//! grammar.add_start("E");
//! grammar
//!     .add_rule(Rule::new("E", &["E", "+", "E"], RuleAction::message("add", &[0, 2]), 1))
//!     .unwrap();
//! grammar
//!     .add_rule(Rule::new("E", &["E", "*", "E"], RuleAction::message("mul", &[0, 2]), 2))
//!     .unwrap();
//! grammar
//!     .add_rule(Rule::new("E", &["n"], RuleAction::Pick(0), 3))
//!     .unwrap();
//! grammar.assoc(Assoc::Left, &["+"], 4);
//! grammar.assoc(Assoc::Left, &["*"], 5);
//! grammar.validate(&mut StrictFaultHandler).unwrap();
//!
//! let hfa = minimal_lr1(&grammar);
//! let mut style = DeterministicStyle::new(true);
//! let tables = tabulate(&hfa, &grammar, &mut style).unwrap();
//! // Every terminal column of every state row now holds a definite parse action.
//! assert!(tables.action_matrix.len() > 4);
//! ```
//!
//! # License
//! [lang_tc](crate) is provided under the MIT license.

pub mod charset;
pub mod grammar;
pub mod hfa;
pub mod regex;
pub mod scanner;
pub mod tables;
pub mod util;

use std::fmt::{Display, Formatter};

/// An agreed artificial "end-of-text" terminal symbol.
///
/// The scanner must never emit this symbol; the table generator reserves terminal index zero
/// for it, and the accepting states of a parse table answer to it.
pub const END_OF_TOKENS: &str = "<END>";

/// An agreed "error" symbol which may appear on the right-hand side of a production rule.
///
/// States entered by shifting this symbol never receive a default reduction, so that error
/// cells stay recognizable at runtime.
pub const ERROR_SYMBOL: &str = "$error$";

/// The scan condition every scanner definition begins with.
pub const DEFAULT_CONDITION: &str = "INITIAL";

/// Version triple carried by the serialized table artifact.
///
/// Consumers must refuse an artifact whose major number differs from their own.
pub const TABLE_FORMAT_VERSION: (u16, u16, u16) = (0, 1, 0);

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to builder and construction utilities.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    /// Function which return order of the log.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}
