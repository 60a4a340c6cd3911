//! Fill-reducing column orderings
//!
//! The column permutation is computed from the sparsity pattern only, before
//! each numeric factorization. Both minimum degree strategies run the same
//! approximate minimum degree elimination on a column/row graph:
//!
//! - every row is a clique of the columns it touches, so the graph of `AᵗA`
//!   is never formed;
//! - eliminating a column merges all of its rows into one superrow, and rows
//!   that end up inside the superrow are absorbed;
//! - columns wait in degree buckets keyed by an upper bound on their external
//!   degree, so the next pivot is found without scanning every column.
//!
//! Dense rows are left out of the graph and dense columns are ordered last.
//! Ties go to the column that most recently entered its bucket, with the
//! lowest index first at the start, so the ordering is deterministic.

use crate::sparse::CscStorage;
use crate::traits::ComplexField;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const NONE: usize = usize::MAX;

/// Column ordering strategy applied before factorization
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColumnOrdering {
    /// Keep the natural column order
    Natural,
    /// Minimum degree on the pattern of `AᵗA`
    #[default]
    MinimumDegreeAtA,
    /// Minimum degree on the pattern of `Aᵗ + A`
    MinimumDegreeAtPlusA,
    /// Caller-supplied permutation: column `k` of the factored matrix is
    /// column `perm[k]` of the input
    Custom(Vec<usize>),
}

impl ColumnOrdering {
    /// Map the classic integer ordering codes (0: natural, 1: `AᵗA`,
    /// 2: `Aᵗ + A`). Other codes have no meaning.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ColumnOrdering::Natural),
            1 => Some(ColumnOrdering::MinimumDegreeAtA),
            2 => Some(ColumnOrdering::MinimumDegreeAtPlusA),
            _ => None,
        }
    }
}

/// Compute the column permutation for `matrix` under `ordering`.
///
/// For the built-in strategies the result is always a permutation of
/// `0..ncols`. A [`ColumnOrdering::Custom`] permutation is returned as is;
/// the direct solver rejects it if it is malformed.
pub fn column_permutation<T: ComplexField>(
    ordering: &ColumnOrdering,
    matrix: &CscStorage<T>,
) -> Vec<usize> {
    let mut perm = Vec::with_capacity(matrix.ncols);
    column_permutation_into(ordering, matrix, &mut perm);
    perm
}

/// Overwrite `perm` with the column permutation, reusing its allocation
pub fn column_permutation_into<T: ComplexField>(
    ordering: &ColumnOrdering,
    matrix: &CscStorage<T>,
    perm: &mut Vec<usize>,
) {
    perm.clear();
    match ordering {
        ColumnOrdering::Natural => perm.extend(0..matrix.ncols),
        ColumnOrdering::MinimumDegreeAtA => {
            approximate_minimum_degree(ColumnRowGraph::at_a(matrix), perm);
        }
        ColumnOrdering::MinimumDegreeAtPlusA => {
            approximate_minimum_degree(ColumnRowGraph::at_plus_a(matrix), perm);
        }
        ColumnOrdering::Custom(custom) => perm.extend_from_slice(custom),
    }
}

/// Whether `perm` is a permutation of `0..perm.len()`
pub fn is_permutation(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// Rows or columns with more entries than this are treated as dense
fn dense_limit(n: usize) -> usize {
    16usize.max((10.0 * (n as f64).sqrt()) as usize)
}

/// Column/row incidence the elimination runs on
struct ColumnRowGraph {
    col_rows: Vec<Vec<usize>>,
    row_cols: Vec<Vec<usize>>,
    /// Columns kept out of the elimination, ordered last
    dense: Vec<usize>,
}

impl ColumnRowGraph {
    /// Rows of `A` as cliques: columns sharing a row are adjacent in `AᵗA`
    fn at_a<T: ComplexField>(matrix: &CscStorage<T>) -> Self {
        let (nrows, ncols) = (matrix.nrows, matrix.ncols);
        let col_limit = dense_limit(nrows);
        let row_limit = dense_limit(ncols);

        let mut dense = Vec::new();
        let mut is_dense = vec![false; ncols];
        let mut row_count = vec![0usize; nrows];
        for j in 0..ncols {
            if matrix.col_range(j).len() > col_limit {
                dense.push(j);
                is_dense[j] = true;
                continue;
            }
            for &i in &matrix.row_indices[matrix.col_range(j)] {
                if i < nrows {
                    row_count[i] += 1;
                }
            }
        }

        let mut row_cols = vec![Vec::new(); nrows];
        let mut col_rows = vec![Vec::new(); ncols];
        for j in (0..ncols).filter(|&j| !is_dense[j]) {
            for &i in &matrix.row_indices[matrix.col_range(j)] {
                if i < nrows && row_count[i] <= row_limit {
                    row_cols[i].push(j);
                    col_rows[j].push(i);
                }
            }
        }

        Self {
            col_rows,
            row_cols,
            dense,
        }
    }

    /// Each off-diagonal pair is a two-column row, giving the graph of `Aᵗ + A`
    fn at_plus_a<T: ComplexField>(matrix: &CscStorage<T>) -> Self {
        let n = matrix.ncols;
        let mut edges = Vec::with_capacity(matrix.nnz());
        for j in 0..n {
            for &i in &matrix.row_indices[matrix.col_range(j)] {
                if i != j && i < n {
                    edges.push((i.min(j), i.max(j)));
                }
            }
        }
        edges.sort_unstable();
        edges.dedup();

        let mut degree = vec![0usize; n];
        for &(a, b) in &edges {
            degree[a] += 1;
            degree[b] += 1;
        }
        let limit = dense_limit(n);
        let dense: Vec<usize> = (0..n).filter(|&j| degree[j] > limit).collect();

        let mut row_cols = Vec::with_capacity(edges.len());
        let mut col_rows = vec![Vec::new(); n];
        for (a, b) in edges {
            if degree[a] > limit || degree[b] > limit {
                continue;
            }
            let row = row_cols.len();
            row_cols.push(vec![a, b]);
            col_rows[a].push(row);
            col_rows[b].push(row);
        }

        Self {
            col_rows,
            row_cols,
            dense,
        }
    }
}

/// Doubly linked degree lists over the columns still to be ordered
struct DegreeBuckets {
    head: Vec<usize>,
    next: Vec<usize>,
    prev: Vec<usize>,
    degree: Vec<usize>,
    min: usize,
}

impl DegreeBuckets {
    fn new(n: usize) -> Self {
        Self {
            head: vec![NONE; n],
            next: vec![NONE; n],
            prev: vec![NONE; n],
            degree: vec![NONE; n],
            min: 0,
        }
    }

    fn insert(&mut self, j: usize, d: usize) {
        let old = self.head[d];
        self.next[j] = old;
        self.prev[j] = NONE;
        if old != NONE {
            self.prev[old] = j;
        }
        self.head[d] = j;
        self.degree[j] = d;
        self.min = self.min.min(d);
    }

    fn remove(&mut self, j: usize) {
        let d = self.degree[j];
        if d == NONE {
            return;
        }
        let (prev, next) = (self.prev[j], self.next[j]);
        if prev == NONE {
            self.head[d] = next;
        } else {
            self.next[prev] = next;
        }
        if next != NONE {
            self.prev[next] = prev;
        }
        self.degree[j] = NONE;
    }

    fn pop_min(&mut self) -> Option<usize> {
        while self.min < self.head.len() && self.head[self.min] == NONE {
            self.min += 1;
        }
        let j = *self.head.get(self.min)?;
        self.remove(j);
        Some(j)
    }
}

/// Sum of `|row| − 1` over the column's rows, capped at `bound`
fn approximate_degree(rows: &[usize], row_cols: &[Vec<usize>], bound: usize) -> usize {
    rows.iter()
        .map(|&r| row_cols[r].len().saturating_sub(1))
        .fold(0usize, usize::saturating_add)
        .min(bound)
}

/// Append the elimination order of `graph` to `order`.
///
/// Returns the number of graph entries visited, which stays proportional to
/// the size of the pattern plus the fill.
fn approximate_minimum_degree(graph: ColumnRowGraph, order: &mut Vec<usize>) -> usize {
    let ColumnRowGraph {
        mut col_rows,
        mut row_cols,
        dense,
    } = graph;
    let n = col_rows.len();
    let mut is_dense = vec![false; n];
    for &j in &dense {
        is_dense[j] = true;
    }

    let mut row_alive = vec![true; row_cols.len()];
    let mut overlap = vec![0usize; row_cols.len()];
    let mut touched = Vec::new();
    let mut mark = vec![0usize; n];
    let mut stamp = 0;
    let mut work = 0;

    let mut remaining = n - dense.len();
    let mut buckets = DegreeBuckets::new(n);
    for j in (0..n).rev().filter(|&j| !is_dense[j]) {
        work += col_rows[j].len();
        let d = approximate_degree(&col_rows[j], &row_cols, remaining - 1);
        buckets.insert(j, d);
    }

    while let Some(pivot) = buckets.pop_min() {
        order.push(pivot);
        remaining -= 1;

        // Merge every row of the pivot into one superrow
        stamp += 1;
        mark[pivot] = stamp;
        let mut superrow = Vec::new();
        for r in std::mem::take(&mut col_rows[pivot]) {
            if !row_alive[r] {
                continue;
            }
            row_alive[r] = false;
            for j in std::mem::take(&mut row_cols[r]) {
                work += 1;
                if mark[j] != stamp {
                    mark[j] = stamp;
                    superrow.push(j);
                }
            }
        }
        if superrow.is_empty() {
            continue;
        }

        // Absorb live rows lying entirely inside the superrow
        for &j in &superrow {
            buckets.remove(j);
            for &r in &col_rows[j] {
                work += 1;
                if row_alive[r] {
                    if overlap[r] == 0 {
                        touched.push(r);
                    }
                    overlap[r] += 1;
                }
            }
        }
        for r in touched.drain(..) {
            if overlap[r] == row_cols[r].len() {
                row_alive[r] = false;
                row_cols[r] = Vec::new();
            }
            overlap[r] = 0;
        }

        let new_row = row_cols.len();
        row_alive.push(true);
        overlap.push(0);
        for &j in &superrow {
            work += col_rows[j].len();
            col_rows[j].retain(|&r| row_alive[r]);
            col_rows[j].push(new_row);
        }
        row_cols.push(superrow);

        for &j in &row_cols[new_row] {
            work += col_rows[j].len();
            let d = approximate_degree(&col_rows[j], &row_cols, remaining - 1);
            buckets.insert(j, d);
        }
    }

    order.extend(dense);
    work
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Arrow matrix: dense first row and column plus the diagonal.
    /// Eliminating the hub first fills everything in.
    fn arrow(n: usize) -> CscStorage<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 4.0));
            if i > 0 {
                triplets.push((0, i, 1.0));
                triplets.push((i, 0, 1.0));
            }
        }
        CscStorage::from_triplets(n, n, triplets).expect("triplets in range")
    }

    fn tridiagonal(n: usize) -> CscStorage<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0));
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
                triplets.push((i + 1, i, -1.0));
            }
        }
        CscStorage::from_triplets(n, n, triplets).expect("triplets in range")
    }

    fn elimination_work(ordering: &ColumnOrdering, a: &CscStorage<f64>) -> (Vec<usize>, usize) {
        let graph = match ordering {
            ColumnOrdering::MinimumDegreeAtA => ColumnRowGraph::at_a(a),
            _ => ColumnRowGraph::at_plus_a(a),
        };
        let mut order = Vec::new();
        let work = approximate_minimum_degree(graph, &mut order);
        (order, work)
    }

    #[test]
    fn test_natural_ordering() {
        let a = arrow(4);
        assert_eq!(
            column_permutation(&ColumnOrdering::Natural, &a),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_minimum_degree_defers_hub() {
        let a = arrow(5);
        let perm = column_permutation(&ColumnOrdering::MinimumDegreeAtPlusA, &a);
        assert!(is_permutation(&perm));
        let hub = perm.iter().position(|&c| c == 0);
        assert!(hub >= Some(3), "hub column should be eliminated last, got {perm:?}");
    }

    #[test]
    fn test_ata_rows_are_column_cliques() {
        // Row 0 touches every column, so every pair of columns is adjacent
        let a = arrow(4);
        let graph = ColumnRowGraph::at_a(&a);
        assert_eq!(graph.row_cols[0], vec![0, 1, 2, 3]);
        assert!(graph.dense.is_empty());
        let perm = column_permutation(&ColumnOrdering::MinimumDegreeAtA, &a);
        assert!(is_permutation(&perm));
    }

    #[test]
    fn test_dense_hub_is_ordered_last() {
        let a = arrow(400);
        for ordering in [
            ColumnOrdering::MinimumDegreeAtA,
            ColumnOrdering::MinimumDegreeAtPlusA,
        ] {
            let perm = column_permutation(&ordering, &a);
            assert!(is_permutation(&perm));
            assert_eq!(perm.last(), Some(&0), "{ordering:?}");
        }
    }

    #[test]
    fn test_elimination_work_is_linear_in_pattern() {
        for ordering in [
            ColumnOrdering::MinimumDegreeAtA,
            ColumnOrdering::MinimumDegreeAtPlusA,
        ] {
            for a in [arrow(20_000), tridiagonal(20_000)] {
                let (order, work) = elimination_work(&ordering, &a);
                assert!(is_permutation(&order));
                assert!(
                    work <= 32 * a.nnz(),
                    "{ordering:?}: {work} visits for {} entries",
                    a.nnz()
                );
            }
        }
    }

    #[test]
    fn test_minimum_degree_is_deterministic_on_diagonal() {
        let a = CscStorage::<f64>::identity(4);
        let perm = column_permutation(&ColumnOrdering::MinimumDegreeAtA, &a);
        assert_eq!(perm, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_permutation_reuses_buffer() {
        let a = tridiagonal(6);
        let mut perm = Vec::with_capacity(6);
        let ptr = perm.as_ptr();
        column_permutation_into(&ColumnOrdering::MinimumDegreeAtPlusA, &a, &mut perm);
        assert!(is_permutation(&perm));
        assert_eq!(perm.len(), 6);
        assert_eq!(perm.as_ptr(), ptr);
    }

    #[test]
    fn test_custom_passthrough() {
        let a = arrow(3);
        let perm = column_permutation(&ColumnOrdering::Custom(vec![2, 0, 1]), &a);
        assert_eq!(perm, vec![2, 0, 1]);
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1]));
        assert!(is_permutation(&[]));
        assert!(!is_permutation(&[0, 0, 1]));
        assert!(!is_permutation(&[0, 3, 1]));
    }

    #[test]
    fn test_from_code() {
        assert_eq!(ColumnOrdering::from_code(0), Some(ColumnOrdering::Natural));
        assert_eq!(
            ColumnOrdering::from_code(1),
            Some(ColumnOrdering::MinimumDegreeAtA)
        );
        assert_eq!(ColumnOrdering::from_code(7), None);
    }
}
