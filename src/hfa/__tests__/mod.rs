use crate::grammar::{Assoc, Grammar, Rule, RuleAction, StrictFaultHandler};
use crate::hfa::{
    canonical_lr1, lalr_construction, lr0_construction, minimal_lr1, Hfa, HfaState, ParseItemMap,
};

fn message(name: &str, indices: &[usize]) -> RuleAction {
    RuleAction::message(name, indices)
}

/// `S → aXd | aYe | bXe | bYd ; X → c ; Y → c` is the classic LR(1)-but-not-LALR grammar:
/// merging the two c-states loses which of d/e is legal next.
fn non_lalr_grammar() -> Grammar {
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &["a", "X", "d"], message("axd", &[1]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["a", "Y", "e"], message("aye", &[1]), 2)).unwrap();
    grammar.add_rule(Rule::new("S", &["b", "X", "e"], message("bxe", &[1]), 3)).unwrap();
    grammar.add_rule(Rule::new("S", &["b", "Y", "d"], message("byd", &[1]), 4)).unwrap();
    grammar.add_rule(Rule::new("X", &["c"], RuleAction::Pick(0), 5)).unwrap();
    grammar.add_rule(Rule::new("Y", &["c"], RuleAction::Pick(0), 6)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    grammar
}

fn palindrome_grammar() -> Grammar {
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &[], message("nil", &[]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["a", "S", "a"], RuleAction::Pick(1), 2)).unwrap();
    grammar.add_rule(Rule::new("S", &["b", "S", "b"], RuleAction::Pick(1), 3)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    grammar
}

fn ambiguous_grammar() -> Grammar {
    // S → aX | Yc ; X → bc ; Y → ab: the sentence "abc" parses both ways.
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &["a", "X"], message("ax", &[1]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["Y", "c"], message("yc", &[0]), 2)).unwrap();
    grammar.add_rule(Rule::new("X", &["b", "c"], message("bc", &[]), 3)).unwrap();
    grammar.add_rule(Rule::new("Y", &["a", "b"], message("ab", &[]), 4)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    grammar
}

fn parse<S: HfaState>(
    hfa: &Hfa<S>,
    grammar: &Grammar,
    sentence: &str,
    language_index: usize,
) -> Result<usize, String> {
    let tokens: Vec<String> = sentence.chars().map(|c| c.to_string()).collect();
    hfa.trial_parse(grammar, tokens.iter().map(String::as_str), language_index)
}

#[test]
fn canonical_and_minimal_accept_what_lalr_cannot_decide() {
    let grammar = non_lalr_grammar();
    // LALR merges the two c-states, so strict determinization must report the clash.
    let lalr = lalr_construction(&grammar);
    let strict = crate::tables::tabulate(
        &lalr,
        &grammar,
        &mut crate::tables::DeterministicStyle::new(true),
    );
    assert!(strict.is_err());
    for hfa in [canonical_lr1(&grammar), minimal_lr1(&grammar)] {
        for sentence in ["acd", "ace", "bce", "bcd"] {
            assert_eq!(parse(&hfa, &grammar, sentence, 0), Ok(1), "on {:?}", sentence);
        }
        assert!(parse(&hfa, &grammar, "abc", 0).is_err());
        assert!(parse(&hfa, &grammar, "ace ", 0).is_err());
    }
}

#[test]
fn state_counts_order_lalr_minimal_canonical() {
    let grammar = non_lalr_grammar();
    let lalr = lalr_construction(&grammar);
    let minimal = minimal_lr1(&grammar);
    let canonical = canonical_lr1(&grammar);
    // The merged c-state is inadequate, so minimal must split it; canonical cannot do better.
    assert!(lalr.graph.len() < minimal.graph.len());
    assert!(minimal.graph.len() <= canonical.graph.len());
}

#[test]
fn canonical_splits_adequate_states_that_minimal_keeps_merged() {
    // A → c completes under different followers in the two contexts, yet LALR is adequate:
    // minimal stays at the LALR size while canonical tells the contexts apart anyway.
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &["a", "A", "x"], message("sax", &[1]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["b", "A", "y"], message("sby", &[1]), 2)).unwrap();
    grammar.add_rule(Rule::new("A", &["c"], message("c", &[]), 3)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    let lalr = lalr_construction(&grammar);
    let minimal = minimal_lr1(&grammar);
    let canonical = canonical_lr1(&grammar);
    assert_eq!(minimal.graph.len(), lalr.graph.len());
    assert!(minimal.graph.len() < canonical.graph.len());
    for sentence in ["acx", "bcy"] {
        assert_eq!(parse(&canonical, &grammar, sentence, 0), Ok(1));
        assert_eq!(parse(&minimal, &grammar, sentence, 0), Ok(1));
    }
    assert!(parse(&canonical, &grammar, "acy", 0).is_err());
}

#[test]
fn minimal_splits_only_where_lalr_is_inadequate() {
    // A deterministic, LALR-friendly grammar: the minimal construction must not split at all.
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &["S", "x"], message("snoc", &[0]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["x"], message("one", &[]), 2)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    let lalr = lalr_construction(&grammar);
    let minimal = minimal_lr1(&grammar);
    assert_eq!(lalr.graph.len(), minimal.graph.len());
}

#[test]
fn even_palindromes_parse_nondeterministically() {
    let grammar = palindrome_grammar();
    let hfa = lalr_construction(&grammar);
    for sentence in ["", "abba", "aabbbbaa", "abbaabba"] {
        assert_eq!(parse(&hfa, &grammar, sentence, 0), Ok(1), "on {:?}", sentence);
    }
    for sentence in ["aba", "abab"] {
        assert!(parse(&hfa, &grammar, sentence, 0).is_err(), "on {:?}", sentence);
    }
}

#[test]
fn ambiguous_sentence_has_two_derivations() {
    let grammar = ambiguous_grammar();
    let hfa = lalr_construction(&grammar);
    assert_eq!(parse(&hfa, &grammar, "abc", 0), Ok(2));
    assert!(parse(&hfa, &grammar, "ab", 0).is_err());
}

#[test]
fn lookahead_separates_what_lr0_conflates() {
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &["A", "x"], message("ax", &[0]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["B", "y"], message("by", &[0]), 2)).unwrap();
    grammar.add_rule(Rule::new("A", &["c"], message("a", &[]), 3)).unwrap();
    grammar.add_rule(Rule::new("B", &["c"], message("b", &[]), 4)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    let hfa = lalr_construction(&grammar);
    assert_eq!(parse(&hfa, &grammar, "cx", 0), Ok(1));
    assert_eq!(parse(&hfa, &grammar, "cy", 0), Ok(1));
    assert!(parse(&hfa, &grammar, "cz", 0).is_err());

    // The one reducing state carries both rules, keyed to disjoint lookahead.
    let conflated = hfa
        .graph
        .iter()
        .find(|state| state.reduce.get("x").is_some() && state.reduce.get("y").is_some())
        .expect("the c-state reduces on both lookaheads");
    assert_eq!(conflated.reduce["x"], vec![2]);
    assert_eq!(conflated.reduce["y"], vec![3]);
}

#[test]
fn unit_rules_are_elided_from_the_graph() {
    let mut grammar = Grammar::new();
    grammar.add_start("E");
    grammar.add_rule(Rule::new("E", &["T"], RuleAction::Pick(0), 1)).unwrap();
    grammar.add_rule(Rule::new("T", &["n"], RuleAction::Pick(0), 2)).unwrap();
    grammar.validate(&mut StrictFaultHandler).unwrap();
    let pim = ParseItemMap::from_grammar(&grammar);
    let build = lr0_construction(&grammar, &pim);
    let q0 = build.hfa.initial[0];
    let shifts = &build.hfa.graph[q0].shift;
    // Shifting n, T, or E all land in the same place: both unit rules ran at generation time.
    assert_eq!(shifts["n"], shifts["T"]);
    assert_eq!(shifts["T"], shifts["E"]);
    assert_eq!(build.hfa.accept[0], shifts["E"]);

    let hfa = lalr_construction(&grammar);
    assert_eq!(parse(&hfa, &grammar, "n", 0), Ok(1));
}

#[test]
fn multiple_start_symbols_share_one_automaton() {
    let mut grammar = Grammar::new();
    grammar.add_start("A");
    grammar.add_start("B");
    grammar.add_rule(Rule::new("A", &["a", "z"], message("a", &[]), 1)).unwrap();
    grammar.add_rule(Rule::new("B", &["b", "z"], message("b", &[]), 2)).unwrap();
    let mut handler = crate::grammar::ReportingFaultHandler::new();
    grammar.validate(&mut handler).unwrap();
    assert!(handler.faults.is_empty());

    let hfa = lalr_construction(&grammar);
    assert_eq!(hfa.initial.len(), 2);
    assert_eq!(hfa.accept.len(), 2);
    assert_eq!(parse(&hfa, &grammar, "az", 0), Ok(1));
    assert_eq!(parse(&hfa, &grammar, "bz", 1), Ok(1));
    assert!(parse(&hfa, &grammar, "bz", 0).is_err());
}

#[test]
fn breadcrumbs_name_the_way_in() {
    let grammar = non_lalr_grammar();
    let hfa = lalr_construction(&grammar);
    let accept = hfa.accept[0];
    assert_eq!(hfa.ledger.breadcrumbs[accept].as_deref(), Some("S"));
    let path = hfa.ledger.shortest_path_to(accept);
    assert_eq!(path.first(), Some(&hfa.initial[0]));
    // The situation display is diagnostics; it just has to hold together.
    hfa.display_situation(&grammar, accept, "<END>");

    let dot_path = std::env::temp_dir().join("lang_tc_non_lalr.dot");
    hfa.make_dot_file(&dot_path).unwrap();
    let rendered = std::fs::read_to_string(&dot_path).unwrap();
    assert!(rendered.starts_with("digraph {"));
    assert!(rendered.contains("-> "));
    std::fs::remove_file(&dot_path).ok();
}

#[test]
fn nonassociativity_leaves_an_essential_error() {
    let mut grammar = Grammar::new();
    grammar.add_start("E");
    grammar.add_rule(Rule::new("E", &["E", "=", "E"], message("eq", &[0, 2]), 1)).unwrap();
    grammar.add_rule(Rule::new("E", &["n"], RuleAction::Pick(0), 2)).unwrap();
    grammar.assoc(Assoc::Nonassoc, &["="], 3);
    grammar.validate(&mut StrictFaultHandler).unwrap();
    let hfa = lalr_construction(&grammar);
    let sentinel = hfa
        .graph
        .iter()
        .find(|state| state.reduce.get("=").map_or(false, Vec::is_empty));
    assert!(sentinel.is_some(), "the E=E state must refuse another '='");
    assert_eq!(parse(&hfa, &grammar, "n=n", 0), Ok(1));
    assert!(parse(&hfa, &grammar, "n=n=n", 0).is_err());
}

#[test]
fn precedence_prunes_shifts_and_reduces() {
    let mut grammar = Grammar::new();
    grammar.add_start("E");
    grammar.add_rule(Rule::new("E", &["E", "+", "E"], message("add", &[0, 2]), 1)).unwrap();
    grammar.add_rule(Rule::new("E", &["E", "*", "E"], message("mul", &[0, 2]), 2)).unwrap();
    grammar.add_rule(Rule::new("E", &["n"], RuleAction::Pick(0), 3)).unwrap();
    grammar.assoc(Assoc::Left, &["+"], 4);
    grammar.assoc(Assoc::Left, &["*"], 5);
    grammar.validate(&mut StrictFaultHandler).unwrap();
    let hfa = minimal_lr1(&grammar);
    // Ambiguous grammar, but precedence resolves every inadequacy: exactly one parse.
    assert_eq!(parse(&hfa, &grammar, "n+n*n", 0), Ok(1));
    assert_eq!(parse(&hfa, &grammar, "n*n+n", 0), Ok(1));
    assert_eq!(parse(&hfa, &grammar, "n+n+n", 0), Ok(1));
}

#[test]
fn parse_item_map_knows_its_geometry() {
    let grammar = palindrome_grammar();
    let pim = ParseItemMap::from_grammar(&grammar);
    // Three rules (0+1, 3+1, 3+1 items) plus one augmented rule (2 items).
    assert_eq!(pim.len(), 1 + 4 + 4 + 2);
    // The augmented item shifts the start symbol.
    let augmented = pim.language_front[0];
    assert_eq!(pim.symbol_at[augmented].as_deref(), Some("S"));
    assert!(pim.rule_found[augmented] >= grammar.rules.len());
    // End-of-rule items are transparent; a nullable tail extends transparency leftward.
    let s_aSa = pim.symbol_front["S"][1];
    assert!(!pim.transparent[s_aSa]);
    assert!(pim.transparent[s_aSa + 3]);
    assert!(pim.read_set[s_aSa + 1].contains("a"));
    assert!(pim.read_set[s_aSa + 1].contains("b"));
}
