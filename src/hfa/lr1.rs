use super::lr0::UnitRuleEliminator;
use super::{
    find_lalr_sets, lr0_construction, Hfa, LookaheadState, Lr0State, ParseItemMap,
};
use crate::grammar::{Assoc, Grammar};
use crate::hfa::reachable;
use crate::util::{transitive_closure, BreadthFirstTraversal};
use crate::END_OF_TOKENS;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A parse item in LR(1) form: a position in the parse-item map plus a follower.
///
/// In the canonical construction the follower is always a specific terminal (end-of-input for
/// the initial items). In the minimal construction, `None` stands for "the non-conflicted
/// remainder of this rule's LALR reduce set".
pub type Lr1Item = (usize, Option<String>);

/// Before embarking on a quest to produce a minimal LR(1) table by sophisticated methods, it's
/// worth producing the maximal table by (some variant of) Knuth's original method. A Knuth
/// parse item is an LR(0) item augmented with the one token expected AFTER the corresponding
/// rule would be recognized; the initial core looks like `{ .S/# }` in the usual notation.
pub fn canonical_lr1(grammar: &Grammar) -> Hfa<LookaheadState> {
    let pim = ParseItemMap::from_grammar(grammar);
    let build = lr0_construction(grammar, &pim);
    let terminals = grammar.apparent_terminals();

    // The parse items which DIRECTLY follow from predicting `symbol`: the beginnings of each
    // of its rules, with followers being every terminal that might come next after the
    // prediction-symbol got shifted — including the current follower when the tail of the
    // predicting rule is transparent.
    let front = |symbol: &str, follower: &Option<String>, goto_transparent: bool, iso_q: usize| {
        let iso_state = &build.hfa.graph[iso_q];
        let goto_state = &build.hfa.graph[iso_state.shift[symbol]];
        let mut after: BTreeSet<String> =
            goto_state.shift.keys().filter(|s| terminals.contains(*s)).cloned().collect();
        if goto_transparent {
            after.extend(follower.clone());
        }
        let mut items: Vec<Lr1Item> = Vec::new();
        for &lr0_item in &pim.symbol_front[symbol] {
            items.extend(after.iter().map(|lookahead| (lr0_item, Some(lookahead.clone()))));
        }
        items
    };

    let note_reduce = |reduce: &mut BTreeMap<String, Vec<usize>>,
                       follower: &Option<String>,
                       rule_id: usize,
                       _iso_q: usize| {
        let token = follower.clone().expect("canonical items always carry a follower");
        reduce.entry(token).or_default().push(rule_id);
    };

    abstract_lr1_construction(grammar, &pim, &build.catalog, Some(END_OF_TOKENS), front, note_reduce)
}

/// The canonical and minimal LR(1) algorithms have a great deal in common. It seems both
/// instructive and useful to factor out those commonalities. If you stare intently you'll also
/// see similarity to LR(0), but factoring out that particular commonality is not today's
/// exercise.
fn abstract_lr1_construction(
    grammar: &Grammar,
    pim: &ParseItemMap,
    lr0_catalog: &HashMap<BTreeSet<usize>, usize>,
    initial_follow: Option<&str>,
    mut front: impl FnMut(&str, &Option<String>, bool, usize) -> Vec<Lr1Item>,
    mut note_reduce: impl FnMut(&mut BTreeMap<String, Vec<usize>>, &Option<String>, usize, usize),
) -> Hfa<LookaheadState> {
    let ure = UnitRuleEliminator::new(grammar);
    let mut bft: BreadthFirstTraversal<BTreeSet<Lr1Item>> = BreadthFirstTraversal::new();
    let mut graph: Vec<LookaheadState> = Vec::new();
    let initial: Vec<usize> = pim
        .language_front
        .iter()
        .map(|&item| {
            let core: BTreeSet<Lr1Item> =
                [(item, initial_follow.map(str::to_owned))].into_iter().collect();
            bft.lookup(core, None)
        })
        .collect();

    let mut q = 0;
    while q < bft.len() {
        bft.set_current(q);
        let core = bft.key(q).clone();
        let iso_core: BTreeSet<usize> = core.iter().map(|(item, _)| *item).collect();
        let iso_q = lr0_catalog[&iso_core];

        let mut shifted_cores: BTreeMap<String, BTreeSet<Lr1Item>> = BTreeMap::new();
        let mut reduce: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        transitive_closure(core, |lr1_item: &Lr1Item| {
            let (item, follower) = lr1_item;
            match &pim.symbol_at[*item] {
                None => {
                    let rule_id = pim.rule_found[*item];
                    if rule_id < grammar.rules.len() {
                        note_reduce(&mut reduce, follower, rule_id, iso_q);
                    }
                    Vec::new()
                }
                Some(symbol) => {
                    shifted_cores
                        .entry(symbol.clone())
                        .or_default()
                        .insert((item + 1, follower.clone()));
                    if grammar.is_nonterminal(symbol) {
                        front(symbol, follower, pim.transparent[item + 1], iso_q)
                    } else {
                        Vec::new()
                    }
                }
            }
        });

        reachable(&mut shifted_cores, &mut reduce, grammar);
        let shift = ure.find_shifts(&mut bft, shifted_cores, |item: &Lr1Item| pim.rule_found[item.0]);
        graph.push(LookaheadState { shift, reduce });
        q += 1;
    }

    let accept = initial
        .iter()
        .zip(&grammar.start)
        .map(|(&qi, language)| graph[qi].shift[language])
        .collect();
    let (_, _, ledger) = bft.into_parts();
    Hfa { graph, initial, accept, ledger }
}

#[derive(Debug, Clone, Default)]
/// Which tokens are involved in LALR conflicts, and which rules contribute to those conflicts
/// for each token.
pub struct ConflictData {
    /// The rules that conflict on this token.
    pub tokens: BTreeMap<String, BTreeSet<usize>>,
    /// The tokens that conflict on this rule.
    pub rules: BTreeMap<usize, BTreeSet<String>>,
}

/// This drives one of the central ideas of the minimal-LR(1) algorithm: learn which tokens are
/// involved in conflicts, and which rules contribute to those conflicts for each token, as
/// known to LALR.
///
/// Subtlety: if a shift/reduce conflict is DECLARED to shift, it does not impugn the token —
/// but the token still refers to the rule in case some other rule may reduce. The grammar may
/// leave certain things deliberately nondeterministic; wherever that is the case, these
/// algorithms respect it.
pub fn find_conflicts(
    graph: &[Lr0State],
    reduce_sets: &HashMap<(usize, usize), BTreeSet<String>>,
    grammar: &Grammar,
) -> Vec<ConflictData> {
    let mut result = Vec::with_capacity(graph.len());
    for (q, state) in graph.iter().enumerate() {
        // Counting shift keys picks up some nonterminals, but they do no harm.
        let mut degree: BTreeMap<&String, usize> = state.shift.keys().map(|s| (s, 1)).collect();
        for &rule_id in &state.reduce {
            for token in &reduce_sets[&(q, rule_id)] {
                let prefer_shift = state.shift.contains_key(token)
                    && grammar.decide_shift_reduce(token, rule_id) == Some(Assoc::Right);
                if !prefer_shift {
                    *degree.entry(token).or_insert(0) += 1;
                }
            }
        }
        let conflicted_tokens: BTreeSet<String> =
            degree.iter().filter(|(_, &count)| count > 1).map(|(t, _)| (*t).clone()).collect();
        let mut conflict = ConflictData::default();
        for token in &conflicted_tokens {
            conflict.tokens.insert(token.clone(), BTreeSet::new());
        }
        for &rule_id in &state.reduce {
            let contribution: BTreeSet<String> =
                conflicted_tokens.intersection(&reduce_sets[&(q, rule_id)]).cloned().collect();
            for token in &contribution {
                conflict.tokens.get_mut(token).unwrap().insert(rule_id);
            }
            conflict.rules.insert(rule_id, contribution);
        }
        result.push(conflict);
    }
    result
}

/// A hybrid of LALR and canonical LR(1) in which only the conflicted parts are reconsidered in
/// greater detail.
///
/// Each output state has an absolutely minimal set of "siblings" affiliated with a
/// corresponding LALR state, because the only thing distinguishing siblings is the correct
/// final deterministic parse action after the rule associated with a parse item is recognized
/// — and then only for those (generally very few) tokens for which LALR does not figure it
/// out. Unit rule elision applies, and states rendered unreachable by conflict resolution are
/// never considered.
pub fn minimal_lr1(grammar: &Grammar) -> Hfa<LookaheadState> {
    let pim = ParseItemMap::from_grammar(grammar);
    let build = lr0_construction(grammar, &pim);
    let (token_sets, reduce_set_id) = find_lalr_sets(&build, grammar);

    // Everything that might come next in an LR(0) state: its own first-set plus the reduce
    // sets of its reducing items.
    let successors: Vec<BTreeSet<String>> = (0..build.hfa.graph.len())
        .map(|iso_q| {
            let mut union = token_sets[iso_q].clone();
            for &rule_id in &build.hfa.graph[iso_q].reduce {
                union.extend(token_sets[reduce_set_id[&(iso_q, rule_id)]].iter().cloned());
            }
            union
        })
        .collect();

    let reduce_sets: HashMap<(usize, usize), BTreeSet<String>> =
        reduce_set_id.iter().map(|(&key, &id)| (key, token_sets[id].clone())).collect();
    let conflict_data = find_conflicts(&build.hfa.graph, &reduce_sets, grammar);

    let empty: BTreeSet<String> = BTreeSet::new();

    // The parse items which DIRECTLY follow from predicting `symbol`. The complexity here
    // comes from how this algorithm threads the needle between LALR-when-adequate and
    // LR(1)-when-necessary: most of the smarts comes down to understanding what LALR found at
    // the far end of each sub-production, i.e. the LR(0) state reached after shifting the
    // contents of that sub-rule.
    let front = |symbol: &str, follower: &Option<String>, goto_transparent: bool, iso_q: usize| {
        let iso_state = &build.hfa.graph[iso_q];
        let goto_q = iso_state.shift[symbol];
        let goto_conflict = &conflict_data[goto_q].tokens;
        let mut items: Vec<Lr1Item> = Vec::new();
        for (&sub_rule_id, &lr0_item) in
            grammar.symbol_rule_ids[symbol].iter().zip(&pim.symbol_front[symbol])
        {
            let reach = build.hfa.traverse(iso_q, &grammar.rules[sub_rule_id].rhs);
            match follower {
                None => {
                    // We're coming from LALR-land.
                    items.push((lr0_item, None));
                    let reach_conflict =
                        conflict_data[reach].rules.get(&sub_rule_id).unwrap_or(&empty);
                    let mut possible_follow: BTreeSet<String> =
                        reach_conflict.intersection(&successors[goto_q]).cloned().collect();
                    // Things get a bit weird for tokens that are ALSO conflicted in the goto
                    // state. Normally they are ignored here; they come along expressly in
                    // another round as a split from the goto state. However, in case of
                    // epsilon productions those tokens must be included lest the parse table
                    // come out wrong.
                    if reach != iso_q {
                        possible_follow.retain(|t| !goto_conflict.contains_key(t));
                    }
                    for token in possible_follow {
                        items.push((lr0_item, Some(token)));
                    }
                }
                Some(token) => {
                    // The canonical branch. Goto-conflicted tokens will have resulted in
                    // canonical-style parse items; as with canonical, they can follow a
                    // derivation only when the remainder of the current rule is transparent,
                    // with the additional constraint regarding the token's contribution to a
                    // LALR inadequacy in the reach state.
                    if conflict_data[reach].tokens.contains_key(token) && goto_transparent {
                        debug_assert!(goto_conflict.contains_key(token));
                        items.push((lr0_item, Some(token.clone())));
                    }
                }
            }
        }
        items
    };

    // Two cases: a `None` follower stands for the un-conflicted portion of the corresponding
    // LALR reduce set; a specific token must have been implicated in a LALR inadequacy in this
    // state and is handled the same as canonical LR(1). It is possible to reach a particular
    // reduce list more than once if and only if the follower is LALR-inadequate, since a given
    // parse item is visited at most once.
    let note_reduce = |reduce: &mut BTreeMap<String, Vec<usize>>,
                       follower: &Option<String>,
                       rule_id: usize,
                       iso_q: usize| {
        match follower {
            None => {
                let follow_set = &token_sets[reduce_set_id[&(iso_q, rule_id)]];
                let conflicted = &conflict_data[iso_q].rules[&rule_id];
                for token in follow_set.difference(conflicted) {
                    debug_assert!(!reduce.contains_key(token));
                    reduce.insert(token.clone(), vec![rule_id]);
                }
            }
            Some(token) => {
                debug_assert!(conflict_data[iso_q].rules[&rule_id].contains(token));
                let list = reduce.entry(token.clone()).or_default();
                debug_assert!(!list.contains(&rule_id));
                list.push(rule_id);
            }
        }
    };

    abstract_lr1_construction(grammar, &pim, &build.catalog, None, front, note_reduce)
}
