use crate::grammar::{Assoc, Grammar};
use std::collections::{BTreeMap, BTreeSet};

/// Prevent the exploration of useless states by resolving shift/reduce overlaps against the
/// precedence and associativity declarations before a raw state is emitted.
///
/// A shift is deleted whenever the declarations render it impossible; a reduction likewise.
/// Non-association turns the reduce entry into the sentinel empty list, meaning "essential
/// error". When several conflicting rules disagree, only the two well-defined mixes are
/// resolved: LEFT plus NONASSOC keeps the LEFT rules and drops the shift; RIGHT plus
/// undeclared keeps the non-RIGHT rules. The bizarre corner cases cannot be understood solely
/// in terms of actions the parser might take in this state, so they warn on stderr and leave
/// the conflict for the parsing style to decide.
///
/// `step` is generic in its value type because the LALR construction prunes a finished shift
/// table while the LR(1) constructions prune shifted item cores before numbering them.
pub(crate) fn reachable<V>(
    step: &mut BTreeMap<String, V>,
    reduce: &mut BTreeMap<String, Vec<usize>>,
    grammar: &Grammar,
) {
    let tokens: Vec<String> = reduce.keys().cloned().collect();
    for token in tokens {
        if !step.contains_key(&token) {
            continue;
        }
        let rule_id_list = reduce[&token].clone();
        if rule_id_list.is_empty() {
            continue;
        }
        let decide: Vec<Option<Assoc>> =
            rule_id_list.iter().map(|&r| grammar.decide_shift_reduce(&token, r)).collect();
        let ways: BTreeSet<Option<Assoc>> = decide.iter().copied().collect();
        debug_assert!(
            !ways.contains(&Some(Assoc::Bogus)),
            "guaranteed by grammar validation, which ran earlier"
        );
        if ways.len() == 1 {
            match ways.iter().next().unwrap() {
                Some(Assoc::Left) => {
                    step.remove(&token);
                }
                Some(Assoc::Right) => {
                    reduce.remove(&token);
                }
                Some(Assoc::Nonassoc) => {
                    step.remove(&token);
                    reduce.insert(token, Vec::new());
                }
                _ => {}
            }
        } else if ways == [Some(Assoc::Left), Some(Assoc::Nonassoc)].into_iter().collect() {
            step.remove(&token);
            let keep: Vec<usize> = rule_id_list
                .iter()
                .zip(&decide)
                .filter(|(_, d)| **d == Some(Assoc::Left))
                .map(|(&r, _)| r)
                .collect();
            reduce.insert(token, keep);
        } else if ways == [Some(Assoc::Right), None].into_iter().collect() {
            let keep: Vec<usize> = rule_id_list
                .iter()
                .zip(&decide)
                .filter(|(_, d)| **d != Some(Assoc::Right))
                .map(|(&r, _)| r)
                .collect();
            reduce.insert(token, keep);
        } else {
            eprintln!(
                "Fair Warning: '{}' triggers a bizarre operator-precedence corner case.",
                token
            );
        }
    }
}
