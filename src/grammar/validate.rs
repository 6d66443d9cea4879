use super::{Fault, FaultHandler, Grammar};
use crate::util::{strongly_connected_components_hashable, transitive_closure};
use std::collections::{BTreeMap, BTreeSet};

impl Grammar {
    /// Calls the fault handler with every identified fault, in a fixed order: bogons and other
    /// precedence trouble, well-foundedness, reachability, rename loops, nullable loops, then
    /// duplicate rules. The default handler fails on the first fault noticed.
    pub fn validate(&self, handler: &mut dyn FaultHandler) -> Result<(), Fault> {
        self.ops.validate(handler, &self.rules)?;
        self.assert_well_founded(handler)?;
        self.assert_no_orphans(handler)?;
        self.assert_no_rename_loops(handler)?;
        self.assert_no_nullable_loops(handler)?;
        self.assert_no_duplicate_rules(handler)
    }

    /// The algorithm to find nullable symbols and well-founded symbols is basically the same,
    /// with different initial conditions: a bipartite propagation alternating between symbols
    /// and rules. A rule fires when every right-hand-side symbol has; a nonterminal fires when
    /// any of its rules has.
    fn bipartite_closure(&self, roots: impl IntoIterator<Item = String>) -> BTreeSet<String> {
        let mut remain: Vec<usize> = self.rules.iter().map(|rule| rule.rhs.len()).collect();
        transitive_closure(roots, |symbol: &String| {
            let mut out = Vec::new();
            if let Some(rule_ids) = self.mentions.get(symbol) {
                for &rule_id in rule_ids {
                    remain[rule_id] -= 1;
                    if remain[rule_id] == 0 {
                        out.push(self.rules[rule_id].lhs.clone());
                    }
                }
            }
            out
        })
    }

    /// Which symbols may produce the empty string? Cached after the first call; the grammar
    /// is expected to be fully built by then.
    pub fn find_nullable(&self) -> &BTreeSet<String> {
        self.nullable_cache.get_or_init(|| {
            self.bipartite_closure(
                self.rules.iter().filter(|rule| rule.rhs.is_empty()).map(|rule| rule.lhs.clone()),
            )
        })
    }

    /// For each symbol, what terminal symbols might a derivation of it start with?
    ///
    /// This is a least-fixed-point problem particularly suited to Tarjan's SCC algorithm:
    /// every member of a component shares one first-set, and across components the unions flow
    /// in topological order, so each edge is considered only once. Nonterminals are subtracted
    /// from the answer sets at the end.
    pub fn find_first(&self) -> &BTreeMap<String, BTreeSet<String>> {
        self.first_cache.get_or_init(|| {
            let mut first: BTreeMap<String, BTreeSet<String>> = self
                .symbols
                .iter()
                .map(|s| {
                    let direct = if self.is_nonterminal(s) {
                        BTreeSet::new()
                    } else {
                        [s.clone()].into_iter().collect()
                    };
                    (s.clone(), direct)
                })
                .collect();

            // Each nonterminal absorbs first-sets from a prefix of every right-hand side.
            let nullable = self.find_nullable();
            for rule in &self.rules {
                for symbol in &rule.rhs {
                    first.get_mut(&rule.lhs).unwrap().insert(symbol.clone());
                    if !nullable.contains(symbol) {
                        break;
                    }
                }
            }

            let graph: BTreeMap<String, Vec<String>> =
                first.iter().map(|(k, v)| (k.clone(), v.iter().cloned().collect())).collect();
            for component in strongly_connected_components_hashable(&graph) {
                let mut shared: BTreeSet<String> = BTreeSet::new();
                for symbol in &component {
                    for x in first[symbol].clone() {
                        shared.extend(first[&x].iter().cloned());
                    }
                }
                shared.retain(|s| !self.is_nonterminal(s));
                for symbol in component {
                    first.insert(symbol, shared.clone());
                }
            }
            first
        })
    }

    /// "Well-founded" means "can possibly produce a finite sequence of terminals".
    ///
    /// Two examples of ill-founded grammars:
    /// `S -> x S` (there's always one more S) and the mutual version `A -> B y; B -> A x`.
    /// A terminal is well-founded; so is a nullable symbol, since zero is finite; induction by
    /// bipartite closure does the rest.
    fn assert_well_founded(&self, handler: &mut dyn FaultHandler) -> Result<(), Fault> {
        let mut roots = self.apparent_terminals();
        roots.extend(self.find_nullable().iter().cloned());
        let well_founded = self.bipartite_closure(roots);
        let ill_founded: Vec<String> = self
            .symbol_rule_ids
            .keys()
            .filter(|s| !well_founded.contains(*s))
            .cloned()
            .collect();
        if !ill_founded.is_empty() {
            handler.ill_founded_symbols(ill_founded)?;
        }
        Ok(())
    }

    /// Every symbol should be reachable from the start symbol(s): a simple transitive closure.
    fn assert_no_orphans(&self, handler: &mut dyn FaultHandler) -> Result<(), Fault> {
        let mut produces: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for rule in &self.rules {
            produces.entry(rule.lhs.clone()).or_default().extend(rule.rhs.iter().cloned());
        }
        let reached = transitive_closure(self.start.iter().cloned(), |symbol: &String| {
            produces.get(symbol).map_or_else(Vec::new, |set| set.iter().cloned().collect())
        });
        let unreachable: Vec<String> =
            self.symbols.iter().filter(|s| !reached.contains(*s)).cloned().collect();
        if !unreachable.is_empty() {
            handler.unreachable_symbols(unreachable)?;
        }
        Ok(())
    }

    /// If a symbol may be replaced by itself (possibly indirectly) then it is diseased.
    fn assert_no_rename_loops(&self, handler: &mut dyn FaultHandler) -> Result<(), Fault> {
        let mut renames: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rule in &self.rules {
            if rule.rhs.len() == 1 {
                if rule.lhs == rule.rhs[0] {
                    handler.self_recursive_loop(&rule.lhs)?;
                } else {
                    renames.entry(rule.lhs.clone()).or_default().push(rule.rhs[0].clone());
                }
            }
        }
        for component in strongly_connected_components_hashable(&renames) {
            if component.len() > 1 {
                handler.mutual_recursive_loop(component)?;
            }
        }
        Ok(())
    }

    /// Nullable left-self-recursion is OK. All other recursive-nullable-loops are pathological.
    fn assert_no_nullable_loops(&self, handler: &mut dyn FaultHandler) -> Result<(), Fault> {
        let nullable = self.find_nullable().clone();
        let mut reaches: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (rule_id, rule) in self.rules.iter().enumerate() {
            let mut nullable_prefix: Vec<&String> =
                rule.rhs.iter().take_while(|s| nullable.contains(*s)).collect();
            if nullable_prefix.is_empty() {
                continue;
            }
            if *nullable_prefix[0] == rule.lhs {
                nullable_prefix.remove(0);
            }
            if nullable_prefix.iter().any(|s| **s == rule.lhs) {
                // Somehow this case seems qualitatively different.
                handler.nullable_right_recursion(rule_id)?;
            }
            reaches
                .entry(rule.lhs.clone())
                .or_default()
                .extend(nullable_prefix.into_iter().cloned());
        }
        for component in strongly_connected_components_hashable(&reaches) {
            if component.len() > 1 {
                handler.mutual_nullable_recursion(component)?;
            }
        }
        Ok(())
    }

    fn assert_no_duplicate_rules(&self, handler: &mut dyn FaultHandler) -> Result<(), Fault> {
        for rule_ids in self.symbol_rule_ids.values() {
            let mut inverse: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
            for &r in rule_ids {
                inverse.entry(self.rules[r].rhs.clone()).or_default().push(r);
            }
            for duplicates in inverse.into_values() {
                if duplicates.len() > 1 {
                    handler.duplicate_rules(duplicates)?;
                }
            }
        }
        Ok(())
    }
}
