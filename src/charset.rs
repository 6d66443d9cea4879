//! Compact character classes for the scanner generator.
//!
//! A character class is a sorted list of lower bounds with implied exclusion below the first
//! listed bound: a codepoint is a member exactly when an odd number of lower bounds are
//! less-than-or-equal-to it. Set operations on this form are O(|a|+|b|).
//!
//! Codepoint −1 stands for "end of input" so that end-of-file rules blend into the rest of the
//! finite-automaton clockwork. It does not appear in the universal set or in the complement of
//! any class; the only way to get it is expressly from an end-of-file or end-of-line rule.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// A character class: sorted lower bounds, membership by parity.
pub type CharClass = Vec<i32>;

/// The codepoint reserved for end-of-input.
pub const EOF_CODEPOINT: i32 = -1;

pub fn empty() -> CharClass {
    vec![]
}

pub fn universal() -> CharClass {
    vec![0]
}

/// The class holding only the end-of-input marker.
pub fn eof() -> CharClass {
    vec![-1, 0]
}

/// How to tell if a codepoint is a member of the class.
pub fn in_class(cls: &[i32], codepoint: i32) -> bool {
    cls.partition_point(|&b| b <= codepoint) % 2 == 1
}

pub fn singleton(codepoint: i32) -> CharClass {
    vec![codepoint, codepoint + 1]
}

pub fn range_class(first: i32, last: i32) -> CharClass {
    if first <= last {
        vec![first, last + 1]
    } else {
        vec![last, first + 1]
    }
}

pub fn complement(cls: &[i32]) -> CharClass {
    if cls.is_empty() {
        universal()
    } else if cls[0] <= 0 {
        cls[1..].to_vec()
    } else {
        let mut result = vec![0];
        result.extend_from_slice(cls);
        result
    }
}

/// Given a class and a sorted sequence of codepoints, report whether each codepoint is in the
/// class. O(N+M) rather than a membership probe per bound.
pub fn expand(cls: &[i32], bounds: &[i32]) -> Vec<bool> {
    let mut idx = 0;
    bounds
        .iter()
        .map(|&x| {
            while idx < cls.len() && x >= cls[idx] {
                idx += 1;
            }
            idx % 2 == 1
        })
        .collect()
}

/// Arbitrary boolean combination of character classes controlled by `op`.
pub fn combine(op: impl Fn(bool, bool) -> bool, x: &[i32], y: &[i32]) -> CharClass {
    let mut bounds: Vec<i32> = Vec::with_capacity(x.len() + y.len() + 1);
    // The zero is included in case op(false, false) == true.
    bounds.extend_from_slice(x);
    bounds.extend_from_slice(y);
    bounds.push(0);
    bounds.sort_unstable();
    bounds.dedup();
    let mut result = Vec::new();
    for &b in &bounds {
        if (result.len() % 2 == 1) != op(in_class(x, b), in_class(y, b)) {
            result.push(b);
        }
    }
    result
}

pub fn union(a: &[i32], b: &[i32]) -> CharClass {
    combine(|p, q| p || q, a, b)
}

pub fn intersect(a: &[i32], b: &[i32]) -> CharClass {
    combine(|p, q| p && q, a, b)
}

pub fn subtract(a: &[i32], b: &[i32]) -> CharClass {
    intersect(a, &complement(b))
}

/// POSIX-style named classes for the ASCII range, plus the handful of extras a scanner
/// definition language conventionally offers (`ANY`, `DOT`, line-break `R`, shorthand
/// letters and their complements).
pub static NAMED_CLASSES: Lazy<BTreeMap<&'static str, CharClass>> = Lazy::new(|| {
    let mut m: BTreeMap<&'static str, CharClass> = BTreeMap::new();
    let ascii = range_class(0, 127);
    let cntrl = union(&range_class(0, 31), &singleton(127));
    let digit = range_class('0' as i32, '9' as i32);
    let upper = range_class('A' as i32, 'Z' as i32);
    let lower = range_class('a' as i32, 'z' as i32);
    let alpha = union(&upper, &lower);
    let alnum = union(&digit, &alpha);
    let word = union(&alnum, &singleton('_' as i32));
    let space = union(&range_class(9, 13), &singleton(32));
    let xdigit = union(
        &digit,
        &union(&range_class('A' as i32, 'F' as i32), &range_class('a' as i32, 'f' as i32)),
    );
    let print = subtract(&ascii, &cntrl);
    let graph = subtract(&print, &space);
    let punct = subtract(&graph, &alnum);
    let vertical = range_class(10, 13);
    let dot = complement(&vertical);
    let horizontal = union(&range_class(8, 9), &singleton(32));

    m.insert("blank", union(&singleton(9), &singleton(32)));
    m.insert("ANY", universal());
    m.insert("DOT", dot.clone());
    m.insert("vertical", vertical);
    m.insert("horizontal", horizontal.clone());
    // \r\n | \r | \n as a class of its constituent codepoints is not expressible; `R` here
    // names the single-codepoint line-end set used by BOL bookkeeping.
    m.insert("R", union(&singleton(10), &singleton(13)));
    for (shorthand, longhand) in [
        ("d", digit.clone()),
        ("l", alpha.clone()),
        ("w", word.clone()),
        ("s", space.clone()),
        ("h", horizontal),
    ] {
        m.insert(shorthand, longhand.clone());
        let upper_name: &'static str = match shorthand {
            "d" => "D",
            "l" => "L",
            "w" => "W",
            "s" => "S",
            _ => "H",
        };
        m.insert(upper_name, subtract(&dot, &longhand));
    }
    m.insert("ascii", ascii);
    m.insert("cntrl", cntrl);
    m.insert("digit", digit);
    m.insert("upper", upper);
    m.insert("lower", lower);
    m.insert("alpha", alpha);
    m.insert("alnum", alnum);
    m.insert("word", word);
    m.insert("space", space);
    m.insert("xdigit", xdigit);
    m.insert("print", print);
    m.insert("graph", graph);
    m.insert("punct", punct);
    m
});
