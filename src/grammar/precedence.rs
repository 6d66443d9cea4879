use super::{Assoc, Fault, FaultHandler, Rule};
use std::collections::BTreeMap;

/// Coherent bits that deal with operator-precedence parsing. This decides most shift-reduce
/// conflicts.
///
/// Later declarations bind tighter, the way BISON and Lemon read them. Please excuse my dear
/// aunt Sally.
pub struct OperatorPrecedence {
    pub token_precedence: BTreeMap<String, usize>,
    pub level_assoc: Vec<Assoc>,
    level_provenance: Vec<usize>,
    extra_declarations: BTreeMap<String, Vec<usize>>,
}

impl OperatorPrecedence {
    pub fn new() -> Self {
        Self {
            token_precedence: BTreeMap::new(),
            level_assoc: Vec::new(),
            level_provenance: Vec::new(),
            extra_declarations: BTreeMap::new(),
        }
    }

    pub fn assoc(&mut self, direction: Assoc, symbols: &[&str], provenance: usize) {
        debug_assert!(!symbols.is_empty());
        let level = self.level_assoc.len();
        self.level_assoc.push(direction);
        self.level_provenance.push(provenance);
        for &symbol in symbols {
            if self.token_precedence.contains_key(symbol) {
                self.extra_declarations.entry(symbol.to_owned()).or_default().push(provenance);
            } else {
                self.token_precedence.insert(symbol.to_owned(), level);
            }
        }
    }

    /// The symbol representing the precedence of a right-hand side with no explicit
    /// declaration. As a slight refinement of the BISON approach, this is the first terminal
    /// with an *assigned* precedence rather than the first terminal whatsoever.
    pub fn infer_prec_sym<'a>(&self, rhs: &'a [String]) -> Option<&'a str> {
        rhs.iter().find(|s| self.token_precedence.contains_key(*s)).map(String::as_str)
    }

    pub fn determine_rule_precedence(&self, rule: &Rule) -> Option<usize> {
        let prec_sym = rule.prec_sym.as_deref().or_else(|| self.infer_prec_sym(&rule.rhs))?;
        self.token_precedence.get(prec_sym).copied()
    }

    /// Compare a rule's precedence against a lookahead terminal's: a `Left` answer deletes the
    /// shift, `Right` deletes the reduce, and equal precedence defers to the level's
    /// associativity. `None` means the declarations have nothing to say.
    pub fn decide_shift_reduce(&self, symbol: &str, rule: &Rule) -> Option<Assoc> {
        let sp = *self.token_precedence.get(symbol)?;
        let rp = self.determine_rule_precedence(rule)?;
        if rp < sp {
            // The lookahead was declared later, so it binds tighter: the shift survives.
            Some(Assoc::Right)
        } else if rp == sp {
            Some(self.level_assoc[rp])
        } else {
            Some(Assoc::Left)
        }
    }

    pub(crate) fn validate(
        &self,
        handler: &mut dyn FaultHandler,
        rules: &[Rule],
    ) -> Result<(), Fault> {
        for (symbol, extras) in &self.extra_declarations {
            let first = self.level_provenance[self.token_precedence[symbol]];
            handler.precedence_redeclared(symbol, first, extras.clone())?;
        }
        for (rule_id, rule) in rules.iter().enumerate() {
            if self.token_precedence.contains_key(&rule.lhs) {
                handler.nonterminal_given_precedence(&rule.lhs)?;
            }
            if let Some(prec_sym) = &rule.prec_sym {
                if !self.token_precedence.contains_key(prec_sym) {
                    handler.bad_prec_sym(rule_id)?;
                }
            }
            for symbol in &rule.rhs {
                if self.token_precedence.get(symbol).map(|&level| self.level_assoc[level])
                    == Some(Assoc::Bogus)
                {
                    handler.rule_produces_bogon(rule_id, symbol)?;
                }
            }
        }
        Ok(())
    }
}
