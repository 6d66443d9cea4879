use crate::grammar::Grammar;
use std::collections::{BTreeMap, BTreeSet};

/// The key to the whole LR genera is the notion of a parse item: a rule crossed with a marked
/// position in its right-hand side. That pair is an ungainly structure, so this map represents
/// all parse items as contiguous integers: the successor of a parse item is just index + 1.
///
/// `symbol_at[i]` is the symbol after the mark (`None` at the end of a rule); `rule_found[i]`
/// is the rule the item belongs to, with ids at and beyond `grammar.rules.len()` standing for
/// the synthetic accept rules of the augmented grammar. `read_set[i]` holds the terminals that
/// could appear next at that position, and `transparent[i]` says whether everything from the
/// mark to the end of the rule is nullable.
///
/// With this structure, the fact that parse items are also just numbers is almost completely
/// hidden.
pub struct ParseItemMap {
    pub symbol_at: Vec<Option<String>>,
    pub rule_found: Vec<usize>,
    pub read_set: Vec<BTreeSet<String>>,
    pub transparent: Vec<bool>,
    /// The item index beginning each rule of a nonterminal, parallel to `symbol_rule_ids`.
    pub symbol_front: BTreeMap<String, Vec<usize>>,
    /// The item index beginning each synthetic accept rule, one per start symbol.
    pub language_front: Vec<usize>,
}

impl ParseItemMap {
    pub fn from_grammar(grammar: &Grammar) -> Self {
        let mut symbol_at: Vec<Option<String>> = Vec::new();
        let mut rule_found: Vec<usize> = Vec::new();
        let mut symbol_front: BTreeMap<String, Vec<usize>> =
            grammar.symbol_rule_ids.keys().map(|nt| (nt.clone(), Vec::new())).collect();
        let mut language_front: Vec<usize> = Vec::new();

        let mut plonk = |front: &mut Vec<usize>, rhs: &[String], rule_id: usize| {
            front.push(symbol_at.len());
            for symbol in rhs {
                symbol_at.push(Some(symbol.clone()));
                rule_found.push(rule_id);
            }
            symbol_at.push(None);
            rule_found.push(rule_id);
        };

        for (rule_id, rule) in grammar.rules.iter().enumerate() {
            plonk(symbol_front.get_mut(&rule.lhs).unwrap(), &rule.rhs, rule_id);
        }
        for (k, language) in grammar.start.iter().enumerate() {
            plonk(&mut language_front, std::slice::from_ref(language), grammar.rules.len() + k);
        }

        let nullable = grammar.find_nullable();
        let first = grammar.find_first();
        let count = symbol_at.len();
        let mut read_set: Vec<BTreeSet<String>> = vec![BTreeSet::new(); count];
        let mut transparent = vec![false; count];
        for index in (0..count).rev() {
            match &symbol_at[index] {
                None => transparent[index] = true,
                Some(symbol) if grammar.is_nonterminal(symbol) => {
                    read_set[index] = first[symbol].clone();
                    if nullable.contains(symbol) {
                        let tail = read_set[index + 1].clone();
                        read_set[index].extend(tail);
                        transparent[index] = transparent[index + 1];
                    }
                }
                Some(terminal) => {
                    let terminal = terminal.clone();
                    read_set[index].insert(terminal);
                }
            }
        }

        ParseItemMap { symbol_at, rule_found, read_set, transparent, symbol_front, language_front }
    }

    /// Total number of parse items, augmented rules included.
    pub fn len(&self) -> usize {
        self.symbol_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_at.is_empty()
    }
}
