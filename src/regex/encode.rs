use super::{Nfa, RegexAst};

impl RegexAst {
    /// Encode this expression into `nfa` as the language between `src` and `dst`, attaching
    /// `rank` to every state created along the way.
    ///
    /// Each operator emits the minimal states and ε-edges sufficient for its semantics.
    /// `Counted(x, m, n)` unrolls exactly m copies, then either chains up to n−m further
    /// copies with ε-shortcuts to the exit, or loops the last copy back on itself when
    /// unbounded.
    pub fn encode(&self, nfa: &mut Nfa, src: usize, dst: usize, rank: i32) {
        match self {
            RegexAst::CharClass(cls) => nfa.link(src, dst, cls.clone()),
            RegexAst::Alternation(a, b) => {
                a.encode(nfa, src, dst, rank);
                b.encode(nfa, src, dst, rank);
            }
            RegexAst::Sequence(a, b) => {
                let midpoint = nfa.new_node(rank);
                a.encode(nfa, src, midpoint, rank);
                b.encode(nfa, midpoint, dst, rank);
            }
            RegexAst::Star(sub) => {
                let central = nfa.new_node(rank);
                sub.encode(nfa, central, central, rank);
                nfa.link_epsilon(src, central);
                nfa.link_epsilon(central, dst);
            }
            RegexAst::Hook(sub) => {
                sub.encode(nfa, src, dst, rank);
                nfa.link_epsilon(src, dst);
            }
            RegexAst::Plus(sub) => {
                let before = nfa.new_node(rank);
                let after = nfa.new_node(rank);
                sub.encode(nfa, before, after, rank);
                nfa.link_epsilon(src, before);
                nfa.link_epsilon(after, before);
                nfa.link_epsilon(after, dst);
            }
            RegexAst::Counted(sub, m, n) => {
                let mut p1 = nfa.new_node(rank);
                nfa.link_epsilon(src, p1);
                for _ in 0..*m {
                    let p2 = nfa.new_node(rank);
                    sub.encode(nfa, p1, p2, rank);
                    p1 = p2;
                }
                nfa.link_epsilon(p1, dst);
                match n {
                    None => sub.encode(nfa, p1, p1, rank),
                    Some(n) => {
                        for _ in *m..*n {
                            let p2 = nfa.new_node(rank);
                            sub.encode(nfa, p1, p2, rank);
                            nfa.link_epsilon(p2, dst);
                            p1 = p2;
                        }
                    }
                }
            }
        }
    }

    /// The fixed length of this expression, if it has one. Trailing-context analysis depends
    /// on either the stem or the trail having a definite width.
    pub fn fixed_length(&self) -> Option<usize> {
        match self {
            RegexAst::CharClass(_) => Some(1),
            RegexAst::Alternation(a, b) => {
                let (a, b) = (a.fixed_length()?, b.fixed_length()?);
                if a == b {
                    Some(a)
                } else {
                    None
                }
            }
            RegexAst::Sequence(a, b) => Some(a.fixed_length()? + b.fixed_length()?),
            RegexAst::Star(_) | RegexAst::Hook(_) | RegexAst::Plus(_) => None,
            RegexAst::Counted(sub, m, n) => {
                if Some(*m) == *n {
                    sub.fixed_length().map(|w| w * m)
                } else {
                    None
                }
            }
        }
    }
}
