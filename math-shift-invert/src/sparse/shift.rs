//! Diagonal shift `A − σI` on compressed-column storage
//!
//! The shifted matrix is built in one merge-style pass: within each column the
//! entries above the diagonal are copied, the diagonal is shifted (or created
//! when `A` has no stored diagonal there), and the entries below the diagonal
//! are copied. Insertion happens at the sorted position, so the output keeps
//! strictly increasing row indices without a sort pass.

use crate::error::{OperatorError, Result};
use crate::sparse::CscStorage;
use crate::traits::ComplexField;

/// Build `A − σI` from a square compressed-column matrix.
///
/// The result has `nnz(A) + k` entries, where `k ≤ n` is the number of
/// columns of `A` without a stored diagonal entry. Runs in O(nnz + n).
pub fn subtract_shift_from_diagonal<T: ComplexField>(
    a: &CscStorage<T>,
    sigma: T,
) -> Result<CscStorage<T>> {
    if !a.is_square() {
        return Err(OperatorError::NotSquare {
            rows: a.nrows,
            cols: a.ncols,
        });
    }

    let n = a.ncols;
    let mut values = Vec::with_capacity(a.nnz() + n);
    let mut row_indices = Vec::with_capacity(a.nnz() + n);
    let mut col_ptrs = Vec::with_capacity(n + 1);
    col_ptrs.push(0);
    let mut synthesized = 0usize;

    for i in 0..n {
        let end = a.col_ptrs[i + 1];
        let mut j = a.col_ptrs[i];

        while j < end && a.row_indices[j] < i {
            values.push(a.values[j]);
            row_indices.push(a.row_indices[j]);
            j += 1;
        }

        if j < end && a.row_indices[j] == i {
            values.push(a.values[j] - sigma);
            j += 1;
        } else {
            values.push(-sigma);
            synthesized += 1;
        }
        row_indices.push(i);

        while j < end {
            values.push(a.values[j]);
            row_indices.push(a.row_indices[j]);
            j += 1;
        }

        col_ptrs.push(values.len());
    }

    log::debug!(
        "shifted {n}x{n} matrix: nnz {} -> {} ({synthesized} diagonal entries created)",
        a.nnz(),
        values.len()
    );

    Ok(CscStorage {
        nrows: n,
        ncols: n,
        values,
        row_indices,
        col_ptrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    /// 3x3 with a full diagonal
    /// [4 1 0]
    /// [1 4 1]
    /// [0 1 4]
    fn full_diagonal() -> CscStorage<f64> {
        CscStorage::from_parts(
            3,
            3,
            vec![4.0, 1.0, 1.0, 4.0, 1.0, 1.0, 4.0],
            vec![0, 1, 0, 1, 2, 1, 2],
            vec![0, 2, 5, 7],
            true,
        )
        .expect("valid CSC data")
    }

    /// Column 1 has no stored diagonal
    /// [2 1 0]
    /// [1 0 1]
    /// [0 1 2]
    fn missing_diagonal() -> CscStorage<f64> {
        CscStorage::from_parts(
            3,
            3,
            vec![2.0, 1.0, 1.0, 1.0, 1.0, 2.0],
            vec![0, 1, 0, 2, 1, 2],
            vec![0, 2, 4, 6],
            true,
        )
        .expect("valid CSC data")
    }

    #[test]
    fn test_zero_shift_is_identity_when_diagonal_present() {
        let a = full_diagonal();
        let shifted = subtract_shift_from_diagonal(&a, 0.0).expect("square matrix");
        assert_eq!(shifted, a);
    }

    #[test]
    fn test_shift_subtracts_from_existing_diagonal() {
        let a = full_diagonal();
        let shifted = subtract_shift_from_diagonal(&a, 1.5).expect("square matrix");

        assert_eq!(shifted.nnz(), a.nnz());
        assert_eq!(shifted.row_indices, a.row_indices);
        for i in 0..3 {
            assert_relative_eq!(shifted.get(i, i), 2.5, epsilon = 1e-14);
        }
        assert_relative_eq!(shifted.get(0, 1), 1.0);
        assert_relative_eq!(shifted.get(2, 1), 1.0);
    }

    #[test]
    fn test_missing_diagonal_is_synthesized() {
        let a = missing_diagonal();
        let shifted = subtract_shift_from_diagonal(&a, 0.5).expect("square matrix");

        assert_eq!(shifted.nnz(), a.nnz() + 1);
        assert!(shifted.check_structure().is_ok());

        // Column 1 gains exactly the diagonal entry, in sorted position
        assert_eq!(shifted.col_range(1).len(), a.col_range(1).len() + 1);
        let rows: Vec<usize> = shifted.col_entries(1).map(|(r, _)| r).collect();
        assert_eq!(rows, vec![0, 1, 2]);
        assert_relative_eq!(shifted.get(1, 1), -0.5);

        // Neighbouring columns keep their layout, only the diagonal moves
        let col0: Vec<usize> = shifted.col_entries(0).map(|(r, _)| r).collect();
        let col2: Vec<usize> = shifted.col_entries(2).map(|(r, _)| r).collect();
        assert_eq!(col0, vec![0, 1]);
        assert_eq!(col2, vec![1, 2]);
        assert_relative_eq!(shifted.get(0, 0), 1.5);
        assert_relative_eq!(shifted.get(1, 0), 1.0);
        assert_relative_eq!(shifted.get(2, 2), 1.5);
    }

    #[test]
    fn test_zero_shift_keeps_diagonal_values() {
        let a = missing_diagonal();
        let shifted = subtract_shift_from_diagonal(&a, 0.0).expect("square matrix");
        for i in 0..3 {
            assert_relative_eq!(shifted.get(i, i), a.get(i, i));
        }
    }

    #[test]
    fn test_empty_matrix_becomes_scaled_identity() {
        let a: CscStorage<f64> = CscStorage::zeros(4, 4);
        let shifted = subtract_shift_from_diagonal(&a, 2.0).expect("square matrix");
        assert_eq!(shifted.nnz(), 4);
        assert_eq!(shifted.col_ptrs, vec![0, 1, 2, 3, 4]);
        for i in 0..4 {
            assert_relative_eq!(shifted.get(i, i), -2.0);
        }
    }

    #[test]
    fn test_complex_shift() {
        let a = CscStorage::<Complex64>::identity(2);
        let sigma = Complex64::new(0.5, 1.0);
        let shifted = subtract_shift_from_diagonal(&a, sigma).expect("square matrix");
        let d = shifted.get(1, 1);
        assert_relative_eq!(d.re, 0.5);
        assert_relative_eq!(d.im, -1.0);
    }

    #[test]
    fn test_rectangular_rejected() {
        let a: CscStorage<f64> = CscStorage::zeros(3, 2);
        assert!(matches!(
            subtract_shift_from_diagonal(&a, 1.0),
            Err(OperatorError::NotSquare { rows: 3, cols: 2 })
        ));
    }
}
