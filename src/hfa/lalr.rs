use super::{lr0_construction, Hfa, LookaheadState, Lr0Build, ParseItemMap};
use crate::grammar::Grammar;
use crate::hfa::reachable;
use crate::util::strongly_connected_components;
use crate::END_OF_TOKENS;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Building a nondeterministic LALR(1)-style table is a direct extension of the LR(0)
/// construction. LR(0) tables tend to have lots of inadequate states; once we figure out which
/// look-ahead tokens are relevant to which reductions, the automaton gets a good deal more
/// capable. If you stop here you get a table that is more efficient than LR(0) for generalized
/// parsing — and for generalized parsing LALR is probably your best choice, since a "stronger"
/// table means more states to track and slow the parse.
pub fn lalr_construction(grammar: &Grammar) -> Hfa<LookaheadState> {
    let pim = ParseItemMap::from_grammar(grammar);
    let build = lr0_construction(grammar, &pim);
    let (token_sets, reduce_set_id) = find_lalr_sets(&build, grammar);

    let Lr0Build { hfa, .. } = build;
    let graph = hfa
        .graph
        .iter()
        .enumerate()
        .map(|(q, node)| {
            let mut reduce: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for &rule_id in &node.reduce {
                for token in &token_sets[reduce_set_id[&(q, rule_id)]] {
                    // A second rule on the same token is a reduce/reduce conflict.
                    reduce.entry(token.clone()).or_default().push(rule_id);
                }
            }
            // Calling upon `reachable` makes the nondeterministic HFA respect precedence and
            // associativity. This parallels the corresponding call in the LR(1) algorithms,
            // simplifies determinization, and does not change the deterministic semantics.
            // It may leave unreachable states in the graph; they cost nothing.
            let mut step = node.shift.clone();
            reachable(&mut step, &mut reduce, grammar);
            LookaheadState { shift: step, reduce }
        })
        .collect();

    Hfa { graph, initial: hfa.initial, accept: hfa.accept, ledger: hfa.ledger }
}

/// The follow-set computation: a variant of the channel algorithm from chapter 9 of Grune &
/// Jacobs' *Parsing Techniques*. The idea is to build a directed inflow graph by certain rules
/// and then flow terminal symbols around until updates cease — a fix-point over set union. We
/// can do better: orienting the edges correctly and contracting with Tarjan's SCC algorithm,
/// each edge need only be considered once.
///
/// Returns `(token_sets, reduce_set_id)` such that `token_sets[q]` is the first-set of state
/// `q`, and `token_sets[reduce_set_id[(q, rule_id)]]` is the set of tokens on which LALR
/// determines that rule may reduce in state `q`.
///
/// One must not confuse the follow set of a nonterminal edge with the follow set of a reducing
/// parse item, lest one end up with NQLALR.
pub fn find_lalr_sets(
    build: &Lr0Build,
    grammar: &Grammar,
) -> (Vec<BTreeSet<String>>, HashMap<(usize, usize), usize>) {
    let graph = &build.hfa.graph;
    let terminals = grammar.apparent_terminals();

    // Seed the per-state first-sets from the terminals on outgoing shifts; end-of-input can
    // follow a sentence, so accept states get that mark.
    let mut token_sets: Vec<BTreeSet<String>> = graph
        .iter()
        .map(|node| node.shift.keys().filter(|s| terminals.contains(*s)).cloned().collect())
        .collect();
    for &q in &build.hfa.accept {
        token_sets[q].insert(END_OF_TOKENS.to_owned());
    }
    let mut inflow: Vec<Vec<usize>> = vec![Vec::new(); token_sets.len()];

    // One follow set for each reducing parse item in a state.
    let mut reduce_set_id: HashMap<(usize, usize), usize> = HashMap::new();
    for (q, node) in graph.iter().enumerate() {
        for &rule_id in &node.reduce {
            reduce_set_id.insert((q, rule_id), token_sets.len());
            token_sets.push(BTreeSet::new());
            inflow.push(Vec::new());
        }
    }

    // One follow set for each nonterminal edge; the first-set of the successor flows in.
    let mut edge_follow: BTreeMap<(usize, String), usize> = BTreeMap::new();
    for (q, node) in graph.iter().enumerate() {
        for (symbol, &target) in &node.shift {
            if grammar.is_nonterminal(symbol) {
                edge_follow.insert((q, symbol.clone()), token_sets.len());
                token_sets.push(BTreeSet::new());
                inflow.push(vec![target]);
            }
        }
    }

    // The inclusion relation: for every rule of the edge's nonterminal, the edge's follow set
    // flows into the first-set of the state where that rule's recognition completes, and into
    // the follow set of the reducing item there. A missing reducing item means a unit
    // reduction was elided at that spot.
    for ((q, symbol), &edge_fs_id) in &edge_follow {
        for &rule_id in &grammar.symbol_rule_ids[symbol] {
            let rule_end = build.hfa.traverse(*q, &grammar.rules[rule_id].rhs);
            if let Some(&rs_id) = reduce_set_id.get(&(rule_end, rule_id)) {
                inflow[rule_end].push(edge_fs_id);
                inflow[rs_id].push(edge_fs_id);
            }
        }
    }

    // Destructive update to close the union flow: within an SCC everyone shares the union;
    // across SCCs the unions flow in topological order.
    for component in strongly_connected_components(&inflow) {
        let mut union: BTreeSet<String> = BTreeSet::new();
        for &k in &component {
            union.extend(token_sets[k].iter().cloned());
            for &j in &inflow[k] {
                union.extend(token_sets[j].iter().cloned());
            }
        }
        for &k in &component {
            token_sets[k] = union.clone();
        }
    }

    (token_sets, reduce_set_id)
}
