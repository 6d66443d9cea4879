use super::order::grade;
use std::collections::{BTreeSet, HashSet};

/// First-fit-decreasing displacement packing.
///
/// This function finds a set of displacements such that no two `indices[i][j] + displacement[i]`
/// are the same: the core of a compact sparse-matrix representation with O(1) reads. The input
/// states which cells of the original matrix contain non-trivial data: `col ∈ indices[row]`
/// exactly when `matrix[row][col]` is non-trivial.
///
/// Rows are considered in decreasing order of cardinality (ties by original row id), so if
/// Zipf's law applies the result tends to pack densely. Empty rows are assigned an offset equal
/// to the size of the implied check vector, which is also returned.
pub fn first_fit_decreasing(indices: &[BTreeSet<usize>], allow_negative: bool) -> (Vec<i32>, usize) {
    fn first_fit(used: &mut HashSet<i32>, row: &BTreeSet<usize>, allow_negative: bool) -> i32 {
        let least = *row.iter().next().unwrap() as i32;
        let mut offset: i32 = if allow_negative { -least } else { 0 };
        while row.iter().any(|&c| used.contains(&(c as i32 + offset))) {
            offset += 1;
        }
        used.extend(row.iter().map(|&c| c as i32 + offset));
        offset
    }

    let mut used: HashSet<i32> = HashSet::new();
    let mut displacements = vec![0i32; indices.len()];
    let populations: Vec<usize> = indices.iter().map(BTreeSet::len).collect();
    let schedule = grade(&populations, true);
    let mut tail = schedule.len();
    for (rank, &i) in schedule.iter().enumerate() {
        if indices[i].is_empty() {
            // All remaining rows are empty too; they get offset == size of the check vector.
            tail = rank;
            break;
        }
        displacements[i] = first_fit(&mut used, &indices[i], allow_negative);
    }
    let size = used.iter().max().map_or(0, |&m| m as usize + 1);
    for &i in &schedule[tail..] {
        displacements[i] = size as i32;
    }
    (displacements, size)
}
