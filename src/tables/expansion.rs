//! Readers for the compacted scanning and parsing tables prepared by the compaction module.
//! A runtime system for another host language would have to port exactly these.

use super::{CompactAction, CompactDelta, CompactGoto, CompactScanner, DisplacementTable, ReducePlane};
use std::collections::HashMap;

/// Reader for the perfect-hash shape built by the displacement encoder. An absent cell is the
/// caller's cue to consult whatever back-up plan applies.
pub struct DisplacementReader<'a> {
    table: &'a DisplacementTable,
}

impl<'a> DisplacementReader<'a> {
    pub fn new(table: &'a DisplacementTable) -> Self {
        Self { table }
    }

    pub fn get(&self, row: usize, column: usize) -> Option<i32> {
        let index = self.table.offset[row] + column as i32;
        if index >= 0 && (index as usize) < self.table.check.len() {
            let index = index as usize;
            if self.table.check[index] == row as i32 {
                return Some(self.table.value[index]);
            }
        }
        None
    }
}

/// Reader for a boolean field compressed by equivalence classification along both dimensions.
pub struct BooleanFieldReader<'a> {
    row_class: &'a [usize],
    col_class: &'a [usize],
    offset: &'a [i32],
    check: &'a [i32],
}

impl<'a> BooleanFieldReader<'a> {
    pub fn new(
        row_class: &'a [usize],
        col_class: &'a [usize],
        offset: &'a [i32],
        check: &'a [i32],
    ) -> Self {
        Self { row_class, col_class, offset, check }
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        // The bogus-token column is out of range; that's an error cell by definition.
        if row >= self.row_class.len() || col >= self.col_class.len() {
            return false;
        }
        let (rc, cc) = (self.row_class[row], self.col_class[col]);
        let index = self.offset[rc] + cc as i32;
        index >= 0
            && (index as usize) < self.check.len()
            && self.check[index as usize] == rc as i32
    }
}

/// The scanner's delta function, reassembled: first a table of unusual entries, then a
/// background of two modal values per row keyed by a compressed bitmap. The very most common
/// entry in a row is usually the error transition, so the zero-plane stores only exceptions to
/// that rule.
pub struct ScannerDeltaReader<'a> {
    delta: &'a CompactDelta,
    exceptions: DisplacementReader<'a>,
    zeros: HashMap<usize, i32>,
}

impl<'a> ScannerDeltaReader<'a> {
    pub fn new(delta: &'a CompactDelta) -> Self {
        let zeros = delta
            .bg
            .zero_index
            .iter()
            .copied()
            .zip(delta.bg.zero_value.iter().copied())
            .collect();
        Self { delta, exceptions: DisplacementReader::new(&delta.exceptions), zeros }
    }

    pub fn get(&self, state_id: usize, symbol_id: usize) -> i32 {
        if let Some(value) = self.exceptions.get(state_id, symbol_id) {
            return value;
        }
        let broad = BooleanFieldReader::new(
            &self.delta.bg.row_class,
            &self.delta.bg.col_class,
            &self.delta.bg.offset,
            &self.delta.bg.check,
        );
        if broad.get(state_id, symbol_id) {
            self.delta.bg.one[state_id]
        } else {
            self.zeros.get(&state_id).copied().unwrap_or(-1)
        }
    }
}

/// The default-reduction plane: the default applies only where the predicate grants it.
pub struct ReducePlaneReader<'a> {
    plane: &'a ReducePlane,
}

impl<'a> ReducePlaneReader<'a> {
    pub fn new(plane: &'a ReducePlane) -> Self {
        Self { plane }
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        let dr = self.plane.d_reduce[row];
        if dr == 0 {
            return 0;
        }
        // Consulting the predicate costs a few cycles; do it only at need.
        let predicate = BooleanFieldReader::new(
            &self.plane.row_class,
            &self.plane.col_class,
            &self.plane.offset,
            &self.plane.check,
        );
        if predicate.get(row, col) {
            dr
        } else {
            0
        }
    }
}

/// The compact ACTION function: chase the edit chain, then fall back to the reduce plane.
pub struct ActionTableReader<'a> {
    action: &'a CompactAction,
    plane: ReducePlaneReader<'a>,
}

impl<'a> ActionTableReader<'a> {
    pub fn new(action: &'a CompactAction) -> Self {
        Self { action, plane: ReducePlaneReader::new(&action.reduce) }
    }

    pub fn get(&self, state_id: usize, terminal_id: usize) -> i32 {
        let edits = &self.action.edits;
        let mut probe = state_id as i32;
        while probe >= 0 {
            let index = edits.offset[probe as usize] + terminal_id as i32;
            if index >= 0
                && (index as usize) < edits.check.len()
                && edits.check[index as usize] == probe
            {
                return edits.value[index as usize];
            }
            probe = self.action.fallback[probe as usize];
        }
        self.plane.get(state_id, terminal_id)
    }

    /// The encoded reduction for states that may act without awaiting a token: those with a
    /// default reduction, no edits, and no fallback.
    pub fn interactive_step(&self, state_id: usize) -> i32 {
        let absent = self.action.edits.check.len() as i32;
        if self.action.edits.offset[state_id] == absent && self.action.fallback[state_id] == -1 {
            self.action.reduce.d_reduce[state_id]
        } else {
            0
        }
    }
}

/// The compact GOTO function.
pub struct GotoTableReader<'a> {
    goto: &'a CompactGoto,
}

impl<'a> GotoTableReader<'a> {
    pub fn new(goto: &'a CompactGoto) -> Self {
        Self { goto }
    }

    pub fn get(&self, state_id: usize, nonterminal_id: usize) -> i32 {
        let r = self.goto.row_index[state_id];
        let c = self.goto.col_index[nonterminal_id];
        let dominant = r.min(c);
        if dominant < self.goto.mark {
            self.goto.quotient[dominant]
        } else {
            self.goto.quotient[r + c - self.goto.mark]
        }
    }
}

/// Implements the finite-automaton questions (classify, transition, accept, conditions) by
/// reference to a compact scanner artifact, for any consumer that wants to run the tables
/// without re-inflating them.
pub struct CompactScannerReader<'a> {
    scanner: &'a CompactScanner,
    delta: ScannerDeltaReader<'a>,
    finals: HashMap<usize, usize>,
}

impl<'a> CompactScannerReader<'a> {
    pub fn new(scanner: &'a CompactScanner) -> Self {
        let finals = scanner
            .dfa
            .final_states
            .iter()
            .copied()
            .zip(scanner.dfa.rule.iter().copied())
            .collect();
        Self { scanner, delta: ScannerDeltaReader::new(&scanner.dfa.delta), finals }
    }

    pub fn classify(&self, codepoint: i32) -> usize {
        let alphabet = &self.scanner.alphabet;
        alphabet.classes[alphabet.bounds.partition_point(|&b| b <= codepoint)]
    }

    pub fn get_condition(&self, condition_name: &str) -> Option<(usize, usize)> {
        self.scanner.dfa.initial.get(condition_name).copied()
    }

    pub fn get_next_state(&self, current_state: i32, codepoint: i32) -> i32 {
        if current_state < 0 {
            -1
        } else {
            self.delta.get(current_state as usize, self.classify(codepoint))
        }
    }

    pub fn get_state_rule_id(&self, state_id: i32) -> Option<usize> {
        if state_id < 0 {
            None
        } else {
            self.finals.get(&(state_id as usize)).copied()
        }
    }

    pub fn right_context(&self, rule_id: usize) -> Option<i32> {
        self.scanner.action[rule_id].right_context
    }
}
