use super::{Hfa, Lr0State, ParseItemMap};
use crate::grammar::Grammar;
use crate::util::{transitive_closure, BreadthFirstTraversal};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// An LR(0) automaton together with its core catalog, which the LR(1) constructions use to
/// find iso-cores. The catalog is a derived artifact: it lives no longer than the construction
/// run that consumes it.
pub struct Lr0Build {
    pub hfa: Hfa<Lr0State>,
    pub catalog: HashMap<BTreeSet<usize>, usize>,
}

/// A unit rule is eligible to be elided (optimized to nothing) exactly when the state reached
/// by shifting its right-hand side would have no parse items associated with any other rule.
/// Naively, we'd shift the RHS and then immediately back out and reduce to the LHS; instead the
/// shift is redirected as if the LHS had been shifted, essentially running the reduction at
/// table-generation time before a numbered state ever gets allocated.
///
/// Two little caveats: the target state after traversing a unit rule may or may not contain a
/// reduction for that rule, which the LALR construction must tolerate; and the LR(1)
/// constructions must ALSO use this, or they would go looking for iso-cores that don't exist
/// in the LR(0) automaton they start from.
pub(crate) struct UnitRuleEliminator {
    unit_rules: HashMap<usize, String>,
    eligible_rhs: BTreeSet<String>,
}

impl UnitRuleEliminator {
    pub fn new(grammar: &Grammar) -> Self {
        let mut unit_rules = HashMap::new();
        let mut eligible_rhs = BTreeSet::new();
        for (rule_id, rule) in grammar.rules.iter().enumerate() {
            if rule.is_rename() {
                unit_rules.insert(rule_id, rule.lhs.clone());
                eligible_rhs.insert(rule.rhs[0].clone());
            }
        }
        Self { unit_rules, eligible_rhs }
    }

    pub fn find_shifts<I: Clone + Ord + Hash>(
        &self,
        bft: &mut BreadthFirstTraversal<BTreeSet<I>>,
        step: BTreeMap<String, BTreeSet<I>>,
        rule_of: impl Fn(&I) -> usize,
    ) -> BTreeMap<String, usize> {
        let mut replace: BTreeMap<&str, &str> = BTreeMap::new();
        for (symbol, items) in &step {
            if !self.eligible_rhs.contains(symbol) {
                continue;
            }
            let mut each_item = items.iter();
            let rule_id = rule_of(each_item.next().expect("a shifted core is never empty"));
            if self.unit_rules.contains_key(&rule_id)
                && each_item.all(|item| rule_of(item) == rule_id)
            {
                replace.insert(symbol, &self.unit_rules[&rule_id]);
            }
        }
        let mut shifts = BTreeMap::new();
        for symbol in step.keys() {
            let mut proxy = symbol.as_str();
            while let Some(&next) = replace.get(proxy) {
                proxy = next;
            }
            shifts.insert(symbol.clone(), bft.lookup(step[proxy].clone(), Some(proxy)));
        }
        shifts
    }
}

/// In broad strokes, a subset construction with a sophisticated means to identify successor
/// states. The keys are core sets of LR(0) parse items. During the full elaboration of a core,
/// completed parse items become the state's `reduce` entries; look-ahead is nobody's business
/// yet, hence the 0 in LR(0). The net result is a compact table generated very quickly, but
/// with somewhat limited power — in practice LR(0) is a first step for the stronger methods.
pub fn lr0_construction(grammar: &Grammar, pim: &ParseItemMap) -> Lr0Build {
    debug_assert!(!grammar.start.is_empty());
    let ure = UnitRuleEliminator::new(grammar);
    let mut bft: BreadthFirstTraversal<BTreeSet<usize>> = BreadthFirstTraversal::new();
    let mut graph: Vec<Lr0State> = Vec::new();
    let initial: Vec<usize> = pim
        .language_front
        .iter()
        .map(|&item| bft.lookup([item].into_iter().collect(), None))
        .collect();

    let mut q = 0;
    while q < bft.len() {
        bft.set_current(q);
        let core = bft.key(q).clone();
        let mut shifted_cores: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let mut reduce: BTreeSet<usize> = BTreeSet::new();
        transitive_closure(core, |&item| match &pim.symbol_at[item] {
            None => {
                let rule_id = pim.rule_found[item];
                if rule_id < grammar.rules.len() {
                    reduce.insert(rule_id);
                }
                Vec::new()
            }
            Some(symbol) => {
                shifted_cores.entry(symbol.clone()).or_default().insert(item + 1);
                pim.symbol_front.get(symbol).cloned().unwrap_or_default()
            }
        });
        let shift = ure.find_shifts(&mut bft, shifted_cores, |&item| pim.rule_found[item]);
        graph.push(Lr0State { shift, reduce: reduce.into_iter().collect() });
        q += 1;
    }

    let accept = initial
        .iter()
        .zip(&grammar.start)
        .map(|(&qi, language)| graph[qi].shift[language])
        .collect();
    let (_, catalog, ledger) = bft.into_parts();
    Lr0Build { hfa: Hfa { graph, initial, accept, ledger }, catalog }
}
