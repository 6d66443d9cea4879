use crate::grammar::{
    Assoc, Fault, Grammar, ReportingFaultHandler, Rule, RuleAction, StrictFaultHandler,
};

fn rule(lhs: &str, rhs: &[&str], line: usize) -> Rule {
    let action = if rhs.is_empty() {
        RuleAction::message("nil", &[])
    } else {
        RuleAction::Pick(0)
    };
    Rule::new(lhs, rhs, action, line)
}

fn grammar_of(start: &str, rules: &[(&str, &[&str])]) -> Grammar {
    let mut grammar = Grammar::new();
    grammar.add_start(start);
    for (line, &(lhs, rhs)) in rules.iter().enumerate() {
        grammar.add_rule(rule(lhs, rhs, line + 1)).unwrap();
    }
    grammar
}

fn faults_of(grammar: &Grammar) -> Vec<Fault> {
    let mut handler = ReportingFaultHandler::new();
    grammar.validate(&mut handler).unwrap();
    handler.faults
}

#[test]
fn a_clean_grammar_validates_quietly() {
    let grammar = grammar_of(
        "S",
        &[("S", &["S", "x"]), ("S", &["x"])],
    );
    grammar.validate(&mut StrictFaultHandler).unwrap();
}

#[test]
fn ill_founded_symbol_is_named() {
    // S -> x S alone: there's always one more S.
    let grammar = grammar_of("S", &[("S", &["x", "S"])]);
    let faults = faults_of(&grammar);
    assert_eq!(faults, vec![Fault::IllFoundedSymbols { symbols: vec!["S".to_owned()] }]);
    assert!(grammar.validate(&mut StrictFaultHandler).is_err());
}

#[test]
fn orphan_symbols_are_reported() {
    let grammar = grammar_of("S", &[("S", &["x"]), ("T", &["y"])]);
    let faults = faults_of(&grammar);
    assert!(faults.iter().any(|f| matches!(
        f,
        Fault::UnreachableSymbols { symbols } if symbols.contains(&"T".to_owned())
    )));
}

#[test]
fn rename_loops_self_and_mutual() {
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &["S"], RuleAction::Pick(0), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["x"], RuleAction::Pick(0), 2)).unwrap();
    let faults = faults_of(&grammar);
    assert!(faults.contains(&Fault::SelfRecursiveLoop { symbol: "S".to_owned() }));

    let mut mutual = Grammar::new();
    mutual.add_start("A");
    mutual.add_rule(Rule::new("A", &["B"], RuleAction::Pick(0), 1)).unwrap();
    mutual.add_rule(Rule::new("B", &["A"], RuleAction::Pick(0), 2)).unwrap();
    mutual.add_rule(Rule::new("A", &["x"], RuleAction::Pick(0), 3)).unwrap();
    let faults = faults_of(&mutual);
    assert!(faults.iter().any(|f| matches!(f, Fault::MutualRecursiveLoop { .. })));
}

#[test]
fn nullable_loops_are_pathological() {
    // E -> x E with a nullable prefix is fine; E appearing inside its own nullable prefix
    // is nullable right-recursion.
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &[], RuleAction::message("nil", &[]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["S", "S"], RuleAction::message("pair", &[0, 1]), 2)).unwrap();
    let faults = faults_of(&grammar);
    assert!(faults.contains(&Fault::NullableRightRecursion { rule_id: 1 }));
}

#[test]
fn mutual_nullable_recursion_is_detected() {
    let mut grammar = Grammar::new();
    grammar.add_start("A");
    grammar.add_rule(Rule::new("A", &["B", "x"], RuleAction::Pick(1), 1)).unwrap();
    grammar.add_rule(Rule::new("B", &["A", "y"], RuleAction::Pick(1), 2)).unwrap();
    grammar.add_rule(Rule::new("A", &[], RuleAction::message("nil", &[]), 3)).unwrap();
    grammar.add_rule(Rule::new("B", &[], RuleAction::message("nil", &[]), 4)).unwrap();
    let faults = faults_of(&grammar);
    assert!(faults.iter().any(|f| matches!(f, Fault::MutualNullableRecursion { .. })));
}

#[test]
fn duplicate_rules_are_flagged() {
    let grammar = grammar_of("S", &[("S", &["x"]), ("S", &["x"])]);
    let faults = faults_of(&grammar);
    assert!(faults.contains(&Fault::DuplicateRules { rule_ids: vec![0, 1] }));
}

#[test]
fn bogus_terminals_must_stay_off_right_hand_sides() {
    let mut grammar = grammar_of("S", &[("S", &["x", "fake"])]);
    grammar.assoc(Assoc::Bogus, &["fake"], 9);
    let faults = faults_of(&grammar);
    assert!(faults.contains(&Fault::RuleProducesBogon { rule_id: 0, symbol: "fake".to_owned() }));
}

#[test]
fn precedence_bookkeeping_faults() {
    let mut grammar = grammar_of("S", &[("S", &["S", "+", "x"]), ("S", &["x"])]);
    grammar.assoc(Assoc::Left, &["+"], 4);
    grammar.assoc(Assoc::Right, &["+"], 5);
    grammar.assoc(Assoc::Left, &["S"], 6);
    let faults = faults_of(&grammar);
    assert!(faults.iter().any(|f| matches!(
        f,
        Fault::PrecedenceRedeclared { symbol, .. } if symbol == "+"
    )));
    assert!(faults.contains(&Fault::NonterminalGivenPrecedence { symbol: "S".to_owned() }));

    let mut bad_sym = grammar_of("S", &[("S", &["x"])]);
    bad_sym.rules[0].prec_sym = Some("ghost".to_owned());
    let faults = faults_of(&bad_sym);
    assert!(faults.contains(&Fault::BadPrecSym { rule_id: 0 }));
}

#[test]
fn nullable_and_first_sets_of_palindromes() {
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    grammar.add_rule(Rule::new("S", &[], RuleAction::message("nil", &[]), 1)).unwrap();
    grammar.add_rule(Rule::new("S", &["a", "S", "a"], RuleAction::Pick(1), 2)).unwrap();
    grammar.add_rule(Rule::new("S", &["b", "S", "b"], RuleAction::Pick(1), 3)).unwrap();
    assert!(grammar.find_nullable().contains("S"));
    let first = grammar.find_first();
    let s_first: Vec<&str> = first["S"].iter().map(String::as_str).collect();
    assert_eq!(s_first, vec!["a", "b"]);
    // Terminals begin with themselves and nothing else.
    assert_eq!(first["a"].len(), 1);
}

#[test]
fn first_sets_flow_through_shared_components() {
    // A and B rename each other's languages; the SCC shares one first-set.
    let mut grammar = Grammar::new();
    grammar.add_start("A");
    grammar.add_rule(Rule::new("A", &["B", "x"], RuleAction::Pick(0), 1)).unwrap();
    grammar.add_rule(Rule::new("B", &["A", "y"], RuleAction::Pick(0), 2)).unwrap();
    grammar.add_rule(Rule::new("B", &["b"], RuleAction::Pick(0), 3)).unwrap();
    let first = grammar.find_first();
    assert_eq!(first["A"], first["B"]);
    assert!(first["A"].contains("b"));
}

#[test]
fn later_declarations_bind_tighter() {
    let mut grammar = Grammar::new();
    grammar.add_start("E");
    grammar
        .add_rule(Rule::new("E", &["E", "+", "E"], RuleAction::message("add", &[0, 2]), 1))
        .unwrap();
    grammar
        .add_rule(Rule::new("E", &["E", "*", "E"], RuleAction::message("mul", &[0, 2]), 2))
        .unwrap();
    grammar.add_rule(Rule::new("E", &["n"], RuleAction::Pick(0), 3)).unwrap();
    grammar.assoc(Assoc::Left, &["+"], 4);
    grammar.assoc(Assoc::Left, &["*"], 5);

    // Holding E+E before '*': shift, because '*' was declared later.
    assert_eq!(grammar.decide_shift_reduce("*", 0), Some(Assoc::Right));
    // Holding E*E before '+': reduce.
    assert_eq!(grammar.decide_shift_reduce("+", 1), Some(Assoc::Left));
    // Equal levels defer to associativity.
    assert_eq!(grammar.decide_shift_reduce("+", 0), Some(Assoc::Left));
    // No declaration, no opinion.
    assert_eq!(grammar.decide_shift_reduce("n", 0), None);
}

#[test]
fn explicit_prec_sym_overrides_inference() {
    let mut grammar = Grammar::new();
    grammar.add_start("E");
    grammar
        .add_rule(
            Rule::new("E", &["-", "E"], RuleAction::message("neg", &[1]), 1).with_prec_sym("UMINUS"),
        )
        .unwrap();
    grammar.add_rule(Rule::new("E", &["E", "-", "E"], RuleAction::message("sub", &[0, 2]), 2)).unwrap();
    grammar.add_rule(Rule::new("E", &["n"], RuleAction::Pick(0), 3)).unwrap();
    grammar.assoc(Assoc::Left, &["-"], 4);
    grammar.assoc(Assoc::Bogus, &["UMINUS"], 5);
    // The unary rule answers with UMINUS's (tighter) level.
    assert_eq!(grammar.decide_shift_reduce("-", 0), Some(Assoc::Left));
    // Validation accepts: UMINUS never appears on a right-hand side.
    assert!(faults_of(&grammar).is_empty());
}

#[test]
fn actions_must_fit_their_right_hand_sides() {
    let mut grammar = Grammar::new();
    grammar.add_start("S");
    assert!(grammar.add_rule(Rule::new("S", &["x"], RuleAction::Pick(1), 1)).is_err());
    assert!(grammar
        .add_rule(Rule::new("S", &["x"], RuleAction::message("m", &[4]), 1))
        .is_err());
    assert!(grammar.add_rule(Rule::new("S", &["x"], RuleAction::Pick(0), 1)).is_ok());
}
