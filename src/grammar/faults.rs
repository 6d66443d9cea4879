use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything that can be wrong with a grammar, one variant per fault kind.
pub enum Fault {
    RuleProducesBogon { rule_id: usize, symbol: String },
    NullableRightRecursion { rule_id: usize },
    NonterminalGivenPrecedence { symbol: String },
    BadPrecSym { rule_id: usize },
    IllFoundedSymbols { symbols: Vec<String> },
    UnreachableSymbols { symbols: Vec<String> },
    DuplicateRules { rule_ids: Vec<usize> },
    PrecedenceRedeclared { symbol: String, first: usize, extras: Vec<usize> },
    SelfRecursiveLoop { symbol: String },
    MutualRecursiveLoop { symbols: Vec<String> },
    MutualNullableRecursion { symbols: Vec<String> },
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::RuleProducesBogon { rule_id, symbol } => {
                write!(f, "Rule {} produces bogus terminal '{}'.", rule_id, symbol)
            }
            Fault::NullableRightRecursion { rule_id } => {
                write!(f, "Rule {} produces nullable right-recursion.", rule_id)
            }
            Fault::NonterminalGivenPrecedence { symbol } => {
                write!(f, "Nonterminal '{}' included in precedence declaration.", symbol)
            }
            Fault::BadPrecSym { rule_id } => write!(
                f,
                "Rule {} has an explicit precedence-symbol without a defined precedence level.",
                rule_id
            ),
            Fault::IllFoundedSymbols { symbols } => {
                write!(f, "Ill-founded symbols: {}.", symbols.join(", "))
            }
            Fault::UnreachableSymbols { symbols } => {
                write!(f, "Unreachable symbols: {}.", symbols.join(", "))
            }
            Fault::DuplicateRules { rule_ids } => write!(
                f,
                "Duplicated rules: {}.",
                rule_ids.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
            ),
            Fault::PrecedenceRedeclared { symbol, first, extras } => write!(
                f,
                "Precedence declared twice on symbol '{}' (first at {}, again at {:?}).",
                symbol, first, extras
            ),
            Fault::SelfRecursiveLoop { symbol } => {
                write!(f, "Symbol '{}' may be replaced by itself in a recursive loop.", symbol)
            }
            Fault::MutualRecursiveLoop { symbols } => write!(
                f,
                "Symbols {} may be replaced by one another in a mutually-recursive loop.",
                symbols.join(", ")
            ),
            Fault::MutualNullableRecursion { symbols } => write!(
                f,
                "Symbols {} form a mutually-recursive nullable loop.",
                symbols.join(", ")
            ),
        }
    }
}

/// One method per fault kind. Every default implementation fails with the fault, so the unit
/// struct [StrictFaultHandler] raises on the first problem; a more lenient handler overrides
/// whichever methods it wants to tolerate, records the fault, and carries on.
pub trait FaultHandler {
    fn rule_produces_bogon(&mut self, rule_id: usize, symbol: &str) -> Result<(), Fault> {
        Err(Fault::RuleProducesBogon { rule_id, symbol: symbol.to_owned() })
    }
    fn nullable_right_recursion(&mut self, rule_id: usize) -> Result<(), Fault> {
        Err(Fault::NullableRightRecursion { rule_id })
    }
    fn nonterminal_given_precedence(&mut self, symbol: &str) -> Result<(), Fault> {
        Err(Fault::NonterminalGivenPrecedence { symbol: symbol.to_owned() })
    }
    fn bad_prec_sym(&mut self, rule_id: usize) -> Result<(), Fault> {
        Err(Fault::BadPrecSym { rule_id })
    }
    fn ill_founded_symbols(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        Err(Fault::IllFoundedSymbols { symbols })
    }
    fn unreachable_symbols(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        Err(Fault::UnreachableSymbols { symbols })
    }
    fn duplicate_rules(&mut self, rule_ids: Vec<usize>) -> Result<(), Fault> {
        Err(Fault::DuplicateRules { rule_ids })
    }
    fn precedence_redeclared(
        &mut self,
        symbol: &str,
        first: usize,
        extras: Vec<usize>,
    ) -> Result<(), Fault> {
        Err(Fault::PrecedenceRedeclared { symbol: symbol.to_owned(), first, extras })
    }
    fn self_recursive_loop(&mut self, symbol: &str) -> Result<(), Fault> {
        Err(Fault::SelfRecursiveLoop { symbol: symbol.to_owned() })
    }
    fn mutual_recursive_loop(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        Err(Fault::MutualRecursiveLoop { symbols })
    }
    fn mutual_nullable_recursion(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        Err(Fault::MutualNullableRecursion { symbols })
    }
}

/// Raise-for-everything behavior; the default handler.
pub struct StrictFaultHandler;

impl FaultHandler for StrictFaultHandler {}

/// Collects every fault and lets validation run to completion.
pub struct ReportingFaultHandler {
    pub faults: Vec<Fault>,
}

impl ReportingFaultHandler {
    pub fn new() -> Self {
        Self { faults: Vec::new() }
    }
    fn note(&mut self, fault: Fault) -> Result<(), Fault> {
        self.faults.push(fault);
        Ok(())
    }
}

impl FaultHandler for ReportingFaultHandler {
    fn rule_produces_bogon(&mut self, rule_id: usize, symbol: &str) -> Result<(), Fault> {
        self.note(Fault::RuleProducesBogon { rule_id, symbol: symbol.to_owned() })
    }
    fn nullable_right_recursion(&mut self, rule_id: usize) -> Result<(), Fault> {
        self.note(Fault::NullableRightRecursion { rule_id })
    }
    fn nonterminal_given_precedence(&mut self, symbol: &str) -> Result<(), Fault> {
        self.note(Fault::NonterminalGivenPrecedence { symbol: symbol.to_owned() })
    }
    fn bad_prec_sym(&mut self, rule_id: usize) -> Result<(), Fault> {
        self.note(Fault::BadPrecSym { rule_id })
    }
    fn ill_founded_symbols(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        self.note(Fault::IllFoundedSymbols { symbols })
    }
    fn unreachable_symbols(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        self.note(Fault::UnreachableSymbols { symbols })
    }
    fn duplicate_rules(&mut self, rule_ids: Vec<usize>) -> Result<(), Fault> {
        self.note(Fault::DuplicateRules { rule_ids })
    }
    fn precedence_redeclared(
        &mut self,
        symbol: &str,
        first: usize,
        extras: Vec<usize>,
    ) -> Result<(), Fault> {
        self.note(Fault::PrecedenceRedeclared { symbol: symbol.to_owned(), first, extras })
    }
    fn self_recursive_loop(&mut self, symbol: &str) -> Result<(), Fault> {
        self.note(Fault::SelfRecursiveLoop { symbol: symbol.to_owned() })
    }
    fn mutual_recursive_loop(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        self.note(Fault::MutualRecursiveLoop { symbols })
    }
    fn mutual_nullable_recursion(&mut self, symbols: Vec<String>) -> Result<(), Fault> {
        self.note(Fault::MutualNullableRecursion { symbols })
    }
}
