use super::{Classifier, Dfa, Nfa};
use crate::charset;
use crate::util::{transitive_closure, BreadthFirstTraversal};
use std::collections::{BTreeMap, BTreeSet};

/// The canonical key of a deterministic state: a subset of NFA states plus the minimum rule
/// rank still in play.
type SubsetKey = (BTreeSet<usize>, i32);

impl Nfa {
    /// The standard plan to convert an NFA to a DFA is to consider that a deterministic state
    /// represents a particular and distinct subset of NFA states. That plan is embodied by the
    /// interplay between the generic [BreadthFirstTraversal] and the work-list loop below.
    ///
    /// This module also supports rule ranks: an extra rank number rides along with each subset.
    /// A state containing final NFA nodes raises its minimum rank to the highest rank among
    /// those finals, accepts the lowest-numbered rule at that rank (so earlier rules win ties),
    /// and thereafter ignores outgoing edges from lower-ranked nodes.
    pub fn subset_construction(&self) -> Dfa {
        let all_bounds: Vec<i32> = {
            let mut bounds = self.all_bounds.clone();
            bounds.insert(charset::EOF_CODEPOINT);
            bounds.into_iter().collect()
        };
        let width = all_bounds.len();

        let close = |ns: &[usize], min_rank: i32| -> SubsetKey {
            let closed = transitive_closure(ns.iter().copied(), |&n| {
                self.states[n].epsilons.iter().copied().collect()
            });
            let subset: BTreeSet<usize> =
                closed.into_iter().filter(|&n| self.states[n].rank >= min_rank).collect();
            let rank = subset.iter().map(|&n| self.states[n].rank).min().unwrap_or(0);
            (subset, rank)
        };

        let mut dfa = Dfa::new(Classifier::Simple { bounds: all_bounds[1..].to_vec() });
        let mut bft: BreadthFirstTraversal<SubsetKey> = BreadthFirstTraversal::new();

        let mut initial = BTreeMap::new();
        for (name, &(mid, bol)) in &self.initial {
            let mid_id = bft.lookup(close(&[mid], 0), None);
            let bol_id = bft.lookup(close(&[bol], 0), None);
            initial.insert(name.clone(), (mid_id, bol_id));
        }
        dfa.initial = initial;

        let mut q = 0;
        while q < bft.len() {
            bft.set_current(q);
            let (subset, mut min_rank) = bft.key(q).clone();

            let finals: Vec<usize> =
                subset.iter().copied().filter(|n| self.finals.contains_key(n)).collect();
            if !finals.is_empty() {
                min_rank = finals.iter().map(|&n| self.states[n].rank).max().unwrap();
                let rule_id = finals
                    .iter()
                    .filter(|&&n| self.states[n].rank == min_rank)
                    .map(|&n| self.finals[&n])
                    .min()
                    .unwrap();
                dfa.finals.insert(q, rule_id);
            }

            let mut active: Vec<Vec<bool>> = Vec::new();
            let mut targets: Vec<usize> = Vec::new();
            for &n in &subset {
                let node = &self.states[n];
                if node.rank >= min_rank {
                    for e in &node.edges {
                        active.push(charset::expand(&e.label, &all_bounds));
                        targets.push(e.target);
                    }
                }
            }

            // Now, if active[i][j], then targets[i] participates in class j. Identical
            // successor registers coalesce, saving a lot of closure operations.
            let mut delta: Vec<i32> = Vec::with_capacity(width);
            let mut prior: Option<Vec<usize>> = None;
            let mut successor: i32 = -1;
            for j in 0..width {
                let register: Vec<usize> =
                    (0..targets.len()).filter(|&i| active[i][j]).map(|i| targets[i]).collect();
                if prior.as_ref() != Some(&register) {
                    let (next_subset, next_rank) = close(&register, min_rank);
                    successor = if next_subset.is_empty() {
                        -1
                    } else {
                        bft.lookup((next_subset, next_rank), None) as i32
                    };
                    prior = Some(register);
                }
                delta.push(successor);
            }
            dfa.append_state(delta);
            q += 1;
        }
        dfa
    }
}
