use super::{Classifier, Dfa, RegexAst};
use ptree::TreeItem;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

impl TreeItem for RegexAst {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self {
            RegexAst::CharClass(cls) => write!(f, "class {:?}", cls),
            RegexAst::Alternation(_, _) => write!(f, "alt"),
            RegexAst::Sequence(_, _) => write!(f, "seq"),
            RegexAst::Star(_) => write!(f, "star"),
            RegexAst::Hook(_) => write!(f, "hook"),
            RegexAst::Plus(_) => write!(f, "plus"),
            RegexAst::Counted(_, m, Some(n)) => write!(f, "counted {{{},{}}}", m, n),
            RegexAst::Counted(_, m, None) => write!(f, "counted {{{},}}", m),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let children: Vec<RegexAst> = match self {
            RegexAst::CharClass(_) => vec![],
            RegexAst::Alternation(a, b) | RegexAst::Sequence(a, b) => {
                vec![(**a).clone(), (**b).clone()]
            }
            RegexAst::Star(sub) | RegexAst::Hook(sub) | RegexAst::Plus(sub) => {
                vec![(**sub).clone()]
            }
            RegexAst::Counted(sub, _, _) => vec![(**sub).clone()],
        };
        Cow::from(children)
    }
}

impl RegexAst {
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl Display for Classifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Classifier::Simple { bounds } => write!(f, "bounds: {:?}", bounds),
            Classifier::Meta { bounds, classes } => {
                write!(f, "bounds: {:?} classes: {:?}", bounds, classes)
            }
        }
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Finite Automaton: {} states over {} classes", self.states.len(), self.width())?;
        writeln!(f, "{}", self.alphabet)?;
        writeln!(f, "Initial: {:?}", self.initial)?;
        for (q, row) in self.states.iter().enumerate() {
            let mark = match self.finals.get(&q) {
                Some(rule_id) => format!("rule {}", rule_id),
                None => String::new(),
            };
            writeln!(f, "{:>4} {:>8}  {:?}", q, mark, row)?;
        }
        Ok(())
    }
}
