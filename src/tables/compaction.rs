//! Parsing literature is rife with approaches to encode scanner and parser tables compactly,
//! with all manner of trade-offs between size and access time. Compact tables fit in cache,
//! and compact forms travel well for storage and interchange. The corresponding readers live
//! in the expansion module.

use super::expansion::ReducePlaneReader;
use super::{
    CompactAction, CompactAlphabet, CompactDelta, CompactDfa, CompactGoto, CompactParser,
    CompactRules, CompactScanner, DeltaBackground, DenseTables, DisplacementTable, ReducePlane,
};
use crate::regex::{Classifier, Dfa};
use crate::scanner::ScanRuleBinding;
use crate::util::{collation, first_fit_decreasing, grade};
use crate::ERROR_SYMBOL;
use std::collections::{BTreeMap, BTreeSet};

/// Group rows into equivalence classes, where cells satisfying `is_dnc` ("don't care") are
/// compatible with anything and get filled in from whichever row settles them first. Returns
/// the class of each row and the merged exemplar rows, ids in first-appearance order.
pub fn find_row_equivalence<T: Clone + PartialEq>(
    matrix: &[Vec<T>],
    is_dnc: impl Fn(&T) -> bool,
) -> (Vec<usize>, Vec<Vec<T>>) {
    let mut index: Vec<usize> = Vec::with_capacity(matrix.len());
    let mut classes: Vec<Vec<T>> = Vec::new();
    'rows: for row in matrix {
        for (class_id, candidate) in classes.iter_mut().enumerate() {
            let compatible = row
                .iter()
                .zip(candidate.iter())
                .all(|(a, b)| a == b || is_dnc(a) || is_dnc(b));
            if compatible {
                index.push(class_id);
                for (slot, value) in candidate.iter_mut().zip(row) {
                    if !is_dnc(value) {
                        *slot = value.clone();
                    }
                }
                continue 'rows;
            }
        }
        index.push(classes.len());
        classes.push(row.clone());
    }
    (index, classes)
}

/// Adapt [find_row_equivalence] to work on columns instead of rows; the classes come back
/// re-transposed, i.e. as rows restricted to one exemplar column per class.
pub fn find_column_equivalence<T: Clone + PartialEq>(
    matrix: &[Vec<T>],
    is_dnc: impl Fn(&T) -> bool,
) -> (Vec<usize>, Vec<Vec<T>>) {
    let (index, classes) = find_row_equivalence(&transpose(matrix), is_dnc);
    (index, transpose(&classes))
}

fn transpose<T: Clone>(matrix: &[Vec<T>]) -> Vec<Vec<T>> {
    match matrix.first() {
        None => Vec::new(),
        Some(first) => (0..first.len())
            .map(|j| matrix.iter().map(|row| row[j].clone()).collect())
            .collect(),
    }
}

/// The values of a row ranked by (frequency, first appearance): the deterministic stand-in for
/// a hash counter's most-common query.
fn ranked_values(row: &[i32]) -> Vec<(i32, usize)> {
    let mut counts: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for (position, &value) in row.iter().enumerate() {
        let entry = counts.entry(value).or_insert((0, position));
        entry.0 += 1;
    }
    let mut ranked: Vec<(i32, usize, usize)> =
        counts.into_iter().map(|(value, (count, first))| (value, count, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(value, count, _)| (value, count)).collect()
}

/// Encode a sparse boolean matrix (given as per-row sets of 1-positions) as an offset/check
/// pair such that `check[offset[row] + col] == row` exactly when the cell was 1.
fn encode_boolean_field(ones: &[BTreeSet<usize>]) -> (Vec<i32>, Vec<i32>) {
    let (offset, size) = first_fit_decreasing(ones, true);
    let mut check = vec![-1i32; size];
    for (row, (base, columns)) in offset.iter().zip(ones).enumerate() {
        for &c in columns {
            check[(base + c as i32) as usize] = row as i32;
        }
    }
    (offset, check)
}

/// Build a textbook displacement table from per-row exception maps. No attempt is made to
/// coalesce similar rows here: that is the caller's responsibility, and only the caller knows
/// the best way to perform such a feat.
fn encode_displacement_function(exceptions: &[BTreeMap<usize, i32>]) -> DisplacementTable {
    let indices: Vec<BTreeSet<usize>> =
        exceptions.iter().map(|row| row.keys().copied().collect()).collect();
    let (offset, size) = first_fit_decreasing(&indices, true);
    let mut check = vec![-1i32; size];
    let mut value = vec![0i32; size];
    for (row_id, row) in exceptions.iter().enumerate() {
        for (&column, &entry) in row {
            let index = (offset[row_id] + column as i32) as usize;
            debug_assert_eq!(check[index], -1);
            check[index] = row_id as i32;
            value[index] = entry;
        }
    }
    DisplacementTable { offset, check, value }
}

/// A possibly-novel approach to condensing large scanner tables.
///
/// Each row splits into two modal values ("zero" and "one") plus exceptions. The background
/// plane is then a partial boolean matrix: classify its columns for equivalence, invert any
/// row more than half dense so the stored 1-mask stays sparse, classify rows, and pack the
/// mask with displacement offsets. Exceptions become a second displacement table.
fn compress_dfa_delta(matrix: &[Vec<i32>]) -> CompactDelta {
    let mut zeros: Vec<i32> = Vec::with_capacity(matrix.len());
    let mut ones: Vec<i32> = Vec::with_capacity(matrix.len());
    let mut residue: Vec<Vec<Option<u8>>> = Vec::with_capacity(matrix.len());
    let mut exceptions: Vec<BTreeMap<usize, i32>> = Vec::with_capacity(matrix.len());
    for row in matrix {
        let mut common: Vec<i32> =
            ranked_values(row).into_iter().filter(|&(_, count)| count > 1).take(2).map(|(v, _)| v).collect();
        if common.is_empty() {
            common.push(row[0]);
        }
        zeros.push(common[0]);
        ones.push(*common.last().unwrap());
        residue.push(
            row.iter()
                .map(|v| common.iter().position(|c| c == v).map(|i| i as u8))
                .collect(),
        );
        exceptions.push(
            row.iter()
                .enumerate()
                .filter(|&(_, v)| !common.contains(v))
                .map(|(c, &v)| (c, v))
                .collect(),
        );
    }

    let (col_class, mut residue) = find_column_equivalence(&residue, Option::is_none);
    for (i, row) in residue.iter_mut().enumerate() {
        let live = row.iter().filter(|cell| **cell == Some(1)).count();
        if live * 2 > row.len() {
            std::mem::swap(&mut zeros[i], &mut ones[i]);
            for cell in row.iter_mut() {
                *cell = cell.map(|x| 1 - x);
            }
        }
    }
    let (row_class, residue) = find_row_equivalence(&residue, Option::is_none);
    let mask: Vec<BTreeSet<usize>> = residue
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell == Some(1))
                .map(|(c, _)| c)
                .collect()
        })
        .collect();
    let (offset, check) = encode_boolean_field(&mask);

    // For most states the most common entry is the error transition; list only the exceptions
    // to that rule.
    let (zero_index, zero_value): (Vec<usize>, Vec<i32>) =
        zeros.iter().enumerate().filter(|(_, &v)| v != -1).map(|(i, &v)| (i, v)).unzip();

    CompactDelta {
        exceptions: encode_displacement_function(&exceptions),
        bg: DeltaBackground { zero_index, zero_value, one: ones, row_class, col_class, offset, check },
    }
}

/// Package a minimized scanner automaton and its rule bindings.
pub fn compress_scanner(dfa: &Dfa, bindings: &[ScanRuleBinding]) -> CompactScanner {
    let alphabet = match &dfa.alphabet {
        Classifier::Meta { bounds, classes } => {
            CompactAlphabet { bounds: bounds.clone(), classes: classes.clone() }
        }
        Classifier::Simple { bounds } => CompactAlphabet {
            bounds: bounds.clone(),
            classes: (0..=bounds.len()).collect(),
        },
    };
    CompactScanner {
        alphabet,
        dfa: CompactDfa {
            delta: compress_dfa_delta(&dfa.states),
            initial: dfa.initial.clone(),
            final_states: dfa.finals.keys().copied().collect(),
            rule: dfa.finals.values().copied().collect(),
        },
        action: bindings.to_vec(),
    }
}

/// The default-reduction plane. Retaining error entries even in states with a default
/// reduction is the point: a semantic partitioning of the ACTION table into "default applies
/// here" (true), "error stays error" (false), and "don't care, another layer answers" (None).
fn compose_reduce_plane(
    action: &[Vec<i32>],
    nonassoc_errors: &BTreeSet<(usize, usize)>,
    recovering_states: &BTreeSet<usize>,
) -> ReducePlane {
    fn best_d_reduce(row: &[i32]) -> i32 {
        let reduces: Vec<i32> = row.iter().copied().filter(|&a| a < 0).collect();
        match ranked_values(&reduces).first() {
            Some(&(value, count)) if count > 1 => value,
            _ => 0,
        }
    }

    let mut d_reduce: Vec<i32> = action.iter().map(|row| best_d_reduce(row)).collect();
    // States reached by the error token may not hide their error cells behind a default
    // reduction, or recovery would chase false restarts.
    for &q in recovering_states {
        d_reduce[q] = 0;
    }

    let mut r_plane: Vec<Vec<Option<bool>>> = action
        .iter()
        .zip(&d_reduce)
        .map(|(row, &dr)| {
            row.iter()
                .map(|&cell| {
                    if cell == 0 {
                        Some(false)
                    } else if cell == dr {
                        Some(true)
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect();
    // Non-association cells are likely to be one-offs; the edit layer picks them up anyway.
    for &(q, t) in nonassoc_errors {
        r_plane[q][t] = None;
    }

    let (col_class, midpoint) = find_column_equivalence(&r_plane, Option::is_none);
    let (row_class, minimal_rows) = find_row_equivalence(&midpoint, Option::is_none);
    let mask: Vec<BTreeSet<usize>> = minimal_rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| **cell == Some(true))
                .map(|(c, _)| c)
                .collect()
        })
        .collect();
    let (offset, check) = encode_boolean_field(&mask);
    ReducePlane { d_reduce, row_class, col_class, offset, check }
}

// If the basis covers a column wrongly, it must be an edit. If the column must be covered and
// the basis does not, it's an edit. But if the basis covers it correctly, it's not.
fn find_edits(
    subject: &[i32],
    basis: &[i32],
    must_cover: &BTreeSet<usize>,
    basis_covers: &BTreeSet<usize>,
) -> Vec<usize> {
    must_cover
        .union(basis_covers)
        .filter(|&&c| !(basis_covers.contains(&c) && basis[c] == subject[c]))
        .copied()
        .collect()
}

/// Find, for each row, a previously placed row whose non-matching columns give the smallest
/// edit set, and record the fallback link plus the edits. Chasing fallbacks at lookup time
/// costs O(chain length); chains form a DAG by construction.
///
/// Performance once was a real problem here, hence the considered loop invariant: the outer
/// loop works subject rows in order of increasing focus population; the inner loop compares
/// against already-solved rows in decreasing population; an arithmetic test shows when the
/// inner loop becomes hopeless. The post-condition worth verifying: the edit chain from row R
/// covers at least the columns in `focus[R]` and matches `action[R]` on all of them.
fn decompose_by_edit_distance(
    action: &[Vec<i32>],
    mut focus: Vec<BTreeSet<usize>>,
) -> (Vec<i32>, Vec<BTreeMap<usize, i32>>) {
    debug_assert_eq!(action.len(), focus.len());
    let mut fallback = vec![-1i32; action.len()];
    let mut edits: Vec<BTreeMap<usize, i32>> = vec![BTreeMap::new(); action.len()];
    // (focus size at insertion, row id), kept sorted ascending.
    let mut solved: Vec<(usize, usize)> = Vec::new();

    let populations: Vec<usize> = focus.iter().map(BTreeSet::len).collect();
    for &current in &grade(&populations, false) {
        let subject = &action[current];
        let must_cover = focus[current].clone();
        let mut fb: i32 = -1;
        let mut best: BTreeMap<usize, i32> =
            must_cover.iter().map(|&c| (c, subject[c])).collect();
        for &(size, candidate) in solved.iter().rev() {
            if best.len() + size < must_cover.len() {
                break;
            }
            let golf = find_edits(subject, &action[candidate], &must_cover, &focus[candidate]);
            if golf.len() < best.len() {
                fb = candidate as i32;
                best = golf.into_iter().map(|c| (c, subject[c])).collect();
            }
        }
        if fb >= 0 {
            let chain_coverage = focus[fb as usize].clone();
            focus[current].extend(chain_coverage);
        }
        fallback[current] = fb;
        edits[current] = best;
        if !edits[current].is_empty() {
            let key = (focus[current].len(), current);
            let position = solved.partition_point(|entry| entry <= &key);
            solved.insert(position, key);
        }
    }
    (fallback, edits)
}

/// Produce the compact representation of the ACTION table.
///
/// `nonassoc_errors` are `(state, terminal)` pairs which must stay errors on account of
/// non-association declarations. They matter twice: mentioned states must not become
/// interactive, and those isolated error cells make good don't-cares for the reduce plane.
pub fn compress_action_table(
    action: &[Vec<i32>],
    nonassoc_errors: &BTreeSet<(usize, usize)>,
    recovering_states: &BTreeSet<usize>,
) -> CompactAction {
    let reduce = compose_reduce_plane(action, nonassoc_errors, recovering_states);
    let focus: Vec<BTreeSet<usize>> = {
        let model = ReducePlaneReader::new(&reduce);
        action
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(c, &cell)| model.get(r, *c) != cell)
                    .map(|(c, _)| c)
                    .collect()
            })
            .collect()
    };
    let (mut fallback, edits) = decompose_by_edit_distance(action, focus);
    for &(q, _) in nonassoc_errors {
        if fallback[q] == -1 && edits[q].is_empty() {
            fallback[q] = -2;
        }
    }
    CompactAction { reduce, fallback, edits: encode_displacement_function(&edits) }
}

/// Look alternately for rows or columns with but a single remaining significant value; record
/// that value in a "quotient" list with bookkeeping for the rows and columns. Afterwards a
/// much smaller residue matrix is left, which ordinary equivalence-class methods pack into a
/// single vector with displacement offsets.
pub fn compress_goto_table(goto_table: &[Vec<i32>]) -> CompactGoto {
    fn remaining(index: &[Option<usize>]) -> Vec<usize> {
        index.iter().enumerate().filter(|(_, x)| x.is_none()).map(|(r, _)| r).collect()
    }
    fn significant_cells(index: &[Option<usize>], vector: &[i32]) -> Vec<i32> {
        index
            .iter()
            .zip(vector)
            .filter(|(x, &v)| x.is_none() && v != 0)
            .map(|(_, &v)| v)
            .collect()
    }
    fn homogenize(vector: &[i32]) -> Option<i32> {
        match vector.first() {
            None => Some(0),
            Some(&head) if vector.iter().all(|&v| v == head) => Some(head),
            _ => None,
        }
    }
    // This takes some pains to keep the quotient list small. It could be very slightly better.
    fn compact_axis(
        target_index: &mut [Option<usize>],
        second_index: &[Option<usize>],
        read: &dyn Fn(usize) -> Vec<i32>,
        quotient: &mut Vec<i32>,
    ) {
        let mut pulled: Vec<(i32, usize)> = remaining(target_index)
            .into_iter()
            .filter_map(|r| homogenize(&significant_cells(second_index, &read(r))).map(|q| (q, r)))
            .collect();
        pulled.sort();
        for (q, i) in pulled {
            if *quotient.last().unwrap() != q {
                quotient.push(q);
            }
            target_index[i] = Some(quotient.len() - 1);
        }
    }

    let height = goto_table.len();
    let width = goto_table.first().map_or(0, Vec::len);
    let mut row_index: Vec<Option<usize>> = vec![None; height];
    let mut col_index: Vec<Option<usize>> = vec![None; width];
    let mut quotient: Vec<i32> = vec![0];
    let mark;
    loop {
        let hi_water_mark = quotient.len();
        let read_row = |r: usize| -> Vec<i32> { goto_table[r].clone() };
        compact_axis(&mut row_index, &col_index, &read_row, &mut quotient);
        let read_col = |c: usize| -> Vec<i32> { goto_table.iter().map(|row| row[c]).collect() };
        compact_axis(&mut col_index, &row_index, &read_col, &mut quotient);
        if quotient.len() == hi_water_mark {
            mark = hi_water_mark;
            break;
        }
    }

    // Capture the much smaller residue matrix and minimize it.
    let row_residue = remaining(&row_index);
    let column_residue = remaining(&col_index);
    let residue_matrix: Vec<Vec<i32>> = row_residue
        .iter()
        .map(|&r| column_residue.iter().map(|&c| goto_table[r][c]).collect())
        .collect();
    let (row_class, minimal_rows) = find_row_equivalence(&residue_matrix, |&v| v == 0);
    let (col_class, minimal_columns) = find_row_equivalence(&transpose(&minimal_rows), |&v| v == 0);

    // Order the column classes so the emptier ones land later: it tends to fit better.
    let zero_counts: Vec<usize> =
        minimal_columns.iter().map(|col| col.iter().filter(|&&v| v == 0).count()).collect();
    let col_class_offset = collation(&zero_counts, false);
    let packed_rows: Vec<BTreeMap<usize, i32>> = transpose(&minimal_columns)
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, &v)| v != 0)
                .map(|(c, &v)| (col_class_offset[c], v))
                .collect()
        })
        .collect();

    // Pack the residue into a single vector with row offsets.
    let key_sets: Vec<BTreeSet<usize>> =
        packed_rows.iter().map(|row| row.keys().copied().collect()).collect();
    let (row_class_offset, size) = first_fit_decreasing(&key_sets, false);
    let mut residue = vec![0i32; size];
    for (row, cells) in row_class_offset.iter().zip(&packed_rows) {
        for (&column, &value) in cells {
            residue[(*row as usize) + column] = value;
        }
    }

    // Fill the holes in the index vectors using the class offsets.
    for (k, &state_id) in row_residue.iter().enumerate() {
        row_index[state_id] = Some(row_class_offset[row_class[k]] as usize + mark);
    }
    for (k, &nonterminal_id) in column_residue.iter().enumerate() {
        col_index[nonterminal_id] = Some(col_class_offset[col_class[k]] + mark);
    }
    quotient.extend(residue);

    CompactGoto {
        row_index: row_index.into_iter().map(Option::unwrap).collect(),
        col_index: col_index.into_iter().map(Option::unwrap).collect(),
        quotient,
        mark,
    }
}

/// Package a determinized parse table: the compact ACTION and GOTO forms plus the rule data,
/// symbol lists, initial states, and breadcrumbs the runtime wants alongside.
pub fn compress_parser(tables: &DenseTables) -> CompactParser {
    // States reached BY the error token: they must keep explicit error entries.
    let mut recovering: BTreeSet<usize> = BTreeSet::new();
    if let Some(error_column) = tables.terminals.iter().position(|t| t == ERROR_SYMBOL) {
        let state_count = tables.action_matrix.len() as i32;
        for row in &tables.action_matrix {
            let cell = row[error_column];
            if cell > 0 && cell < state_count {
                recovering.insert(cell as usize);
            }
        }
    }
    CompactParser {
        action: compress_action_table(&tables.action_matrix, &tables.essential_errors, &recovering),
        goto: compress_goto_table(&tables.goto_matrix),
        rule: CompactRules {
            rules: tables.rule_table.clone(),
            constructor: tables.constructors.clone(),
            line_number: tables.rule_provenance.clone(),
        },
        terminals: tables.terminals.clone(),
        nonterminals: tables.nonterminals.clone(),
        initial: tables.initial.clone(),
        breadcrumbs: tables.breadcrumbs.clone(),
        splits: tables.splits.clone(),
    }
}
