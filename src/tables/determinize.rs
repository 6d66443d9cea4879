use super::{ConflictError, DenseTables, ParsingStyle, RuleEntry};
use crate::grammar::{Grammar, RuleAction};
use crate::hfa::{Hfa, LookaheadState};
use crate::{END_OF_TOKENS, ERROR_SYMBOL};
use std::collections::{BTreeMap, BTreeSet};

/// See the action encoding in the module documentation.
pub fn encode_reduce(rule_id: usize) -> i32 {
    -1 - (rule_id as i32)
}

/// Produce the dense-matrix parse table of textbook fame from an HFA whose states may still be
/// nondeterministic.
///
/// Precedence and associativity are NOT this function's worry: that concern was taken care of
/// in the input HFA, principally by the reachability pruning. Any residual inadequacies of the
/// grammar are delegated to the `style` object for resolution.
pub fn tabulate(
    hfa: &Hfa<LookaheadState>,
    grammar: &Grammar,
    style: &mut dyn ParsingStyle,
) -> Result<DenseTables, ConflictError> {
    debug_assert!(!grammar.symbols.contains(END_OF_TOKENS));
    debug_assert!(!grammar.is_nonterminal(ERROR_SYMBOL));

    let mut terminals = vec![END_OF_TOKENS.to_owned()];
    terminals.extend(grammar.apparent_terminals());
    let translate: BTreeMap<&String, usize> =
        terminals.iter().enumerate().map(|(i, t)| (t, i)).collect();
    let nonterminals: Vec<String> = grammar.symbol_rule_ids.keys().cloned().collect();

    let mut action: Vec<Vec<i32>> = Vec::with_capacity(hfa.graph.len());
    let mut goto: Vec<Vec<i32>> = Vec::with_capacity(hfa.graph.len());
    let mut essential_errors: BTreeSet<(usize, usize)> = BTreeSet::new();

    for (q, state) in hfa.graph.iter().enumerate() {
        goto.push(
            nonterminals
                .iter()
                .map(|s| state.shift.get(s).map_or(0, |&target| target as i32))
                .collect(),
        );
        let mut action_row: Vec<i32> =
            terminals.iter().map(|s| state.shift.get(s).map_or(0, |&target| target as i32)).collect();
        for (symbol, rule_ids) in &state.reduce {
            let idx = translate[symbol];
            let shift = action_row[idx];
            if rule_ids.is_empty() {
                // This is how reachability pruning communicates a non-association situation.
                debug_assert_eq!(shift, 0);
                essential_errors.insert((q, idx));
            } else if shift == 0 && rule_ids.len() == 1 {
                action_row[idx] = encode_reduce(rule_ids[0]);
            } else {
                action_row[idx] = style.decide_inadequacy(q, symbol, shift, rule_ids, grammar);
            }
        }
        action.push(action_row);
    }
    for &(q, t) in &essential_errors {
        action[q][t] = 0;
    }
    for &q in &hfa.accept {
        action[q][0] = q as i32;
    }
    style.report(hfa, grammar)?;
    let splits = style.any_splits();

    // Constructor table: index zero is reserved so that negative entries can mean "pick a
    // right-hand-side element"; message names deduplicate in order of first appearance.
    let mut constructors: Vec<String> = vec![String::new()];
    for rule in &grammar.rules {
        if let RuleAction::Message(name, _) = &rule.action {
            if !constructors.contains(name) {
                constructors.push(name.clone());
            }
        }
    }
    let nontranslate: BTreeMap<&String, usize> =
        nonterminals.iter().enumerate().map(|(i, s)| (s, i)).collect();
    let rule_table: Vec<RuleEntry> = grammar
        .rules
        .iter()
        .map(|rule| {
            let size = rule.rhs.len() as i32;
            let (constructor, captures) = match &rule.action {
                RuleAction::Pick(index) => (*index as i32 - size, Vec::new()),
                RuleAction::Message(name, indices) => {
                    let c = constructors.iter().position(|n| n == name).unwrap() as i32;
                    (c, indices.iter().map(|&x| x as i32 - size).collect())
                }
            };
            RuleEntry {
                lhs_index: nontranslate[&rule.lhs],
                rhs_length: rule.rhs.len(),
                constructor,
                captures,
            }
        })
        .collect();

    // A state is interactive when exactly one distinct non-error action remains: it may
    // reduce eagerly without awaiting a fresh token. Shift-only rows still need the token.
    let mut interactive: Vec<i32> = action
        .iter()
        .map(|row| {
            let distinct: BTreeSet<i32> = row.iter().copied().filter(|&a| a != 0).collect();
            match distinct.len() {
                1 => (*distinct.iter().next().unwrap()).min(0),
                _ => 0,
            }
        })
        .collect();
    for &(q, _) in &essential_errors {
        interactive[q] = 0;
    }

    Ok(DenseTables {
        initial: grammar.start.iter().cloned().zip(hfa.initial.iter().copied()).collect(),
        action_matrix: action,
        goto_matrix: goto,
        essential_errors,
        terminals,
        nonterminals,
        breadcrumbs: hfa.ledger.breadcrumbs.clone(),
        rule_table,
        constructors,
        rule_provenance: grammar.rules.iter().map(|rule| rule.provenance).collect(),
        splits,
        interactive,
    })
}
