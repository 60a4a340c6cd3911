//! Factorization state for shift-invert solves
//!
//! [`FactorizationHandle`] owns the triangular factors and permutations
//! produced by a [`DirectSolver`] and moves between two states:
//!
//! ```text
//! Unfactored --factor / factor_shifted--> Factored
//! Factored   --factor / factor_shifted--> Unfactored --> Factored | Unfactored
//! ```
//!
//! Previous factors are dropped before the engine runs again, so two sets of
//! factors never coexist. Failed attempts leave the handle unfactored and
//! are not retried.

use crate::direct::{DirectSolver, FactorStats, FactorStatus, SparseLu};
use crate::error::{OperatorError, Result};
use crate::ordering::{ColumnOrdering, column_permutation_into};
use crate::sparse::{CscMatrix, CscStorage, subtract_shift_from_diagonal};
use crate::traits::{ComplexField, check_len};
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use std::fmt;

/// Which matrix the current factors belong to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactoredTarget<T> {
    /// The matrix as defined
    Original,
    /// `A − σI` for the stored shift
    Shifted(T),
}

/// Triangular factors and permutations of the most recently factored matrix
pub struct FactorizationHandle<T: ComplexField, E: DirectSolver<T> = SparseLu> {
    engine: E,
    factors: Option<E::Factors>,
    perm_c: Vec<usize>,
    perm_r: Vec<usize>,
    ordering: ColumnOrdering,
    pivot_threshold: f64,
    target: Option<FactoredTarget<T>>,
    stats: Option<FactorStats>,
}

impl<T: ComplexField, E: DirectSolver<T>> fmt::Debug for FactorizationHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorizationHandle")
            .field("factored", &self.is_factored())
            .field("target", &self.target)
            .field("dim", &self.perm_c.len())
            .field("ordering", &self.ordering)
            .field("pivot_threshold", &self.pivot_threshold)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<T: ComplexField, E: DirectSolver<T>> FactorizationHandle<T, E> {
    /// Create an unfactored handle around `engine`
    pub fn new(engine: E, ordering: ColumnOrdering, pivot_threshold: f64) -> Self {
        Self {
            engine,
            factors: None,
            perm_c: Vec::new(),
            perm_r: Vec::new(),
            ordering,
            pivot_threshold,
            target: None,
            stats: None,
        }
    }

    /// Allocate permutation storage for an `n x n` matrix, dropping any factors
    pub fn reserve(&mut self, n: usize) {
        self.release();
        self.perm_c.resize(n, 0);
        self.perm_r.resize(n, 0);
    }

    /// Drop factors and permutation storage
    pub fn release(&mut self) {
        self.invalidate();
        self.perm_c = Vec::new();
        self.perm_r = Vec::new();
    }

    /// Factor the matrix as defined
    pub fn factor(&mut self, matrix: &CscMatrix<T>) -> Result<()> {
        self.invalidate();
        let a = square_storage(matrix)?;
        self.run(a, FactoredTarget::Original)
    }

    /// Factor `A − σI`.
    ///
    /// The shifted matrix only lives for the duration of this call.
    pub fn factor_shifted(&mut self, matrix: &CscMatrix<T>, sigma: T) -> Result<()> {
        self.invalidate();
        let a = square_storage(matrix)?;
        let shifted = subtract_shift_from_diagonal(a, sigma)?;
        self.run(&shifted, FactoredTarget::Shifted(sigma))
    }

    fn invalidate(&mut self) {
        self.factors = None;
        self.target = None;
        self.stats = None;
    }

    fn run(&mut self, a: &CscStorage<T>, target: FactoredTarget<T>) -> Result<()> {
        let n = a.ncols;
        column_permutation_into(&self.ordering, a, &mut self.perm_c);
        self.perm_r.resize(n, 0);

        let mut workspace = self.engine.workspace(n);
        let outcome = self.engine.factor(
            &mut workspace,
            a,
            self.pivot_threshold,
            &self.perm_c,
            &mut self.perm_r,
        );
        let stats = self.engine.stats(&workspace);
        drop(workspace);

        match outcome {
            Ok(factors) => {
                log::debug!(
                    "factored {n}x{n} matrix ({target:?}): nnz {} -> L {} + U {}, fill ratio {:.2}, {} row interchanges",
                    stats.original_nnz,
                    stats.l_nnz,
                    stats.u_nnz,
                    stats.fill_ratio(),
                    stats.row_interchanges
                );
                self.factors = Some(factors);
                self.target = Some(target);
                self.stats = Some(stats);
                Ok(())
            }
            Err(info) => {
                let err = status_to_error(info, n);
                log::warn!("factorization of {n}x{n} matrix ({target:?}) failed: {err}");
                Err(err)
            }
        }
    }

    /// Solve the factored system, returning a new vector
    pub fn solve(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = v.clone();
        self.solve_in_place(w.view_mut())?;
        Ok(w)
    }

    /// Copy `v` into `w`, then overwrite `w` with the solution
    pub fn solve_into(&self, v: ArrayView1<'_, T>, mut w: ArrayViewMut1<'_, T>) -> Result<()> {
        self.factors()?;
        check_len(w.len(), v.len())?;
        w.assign(&v);
        self.solve_in_place(w)
    }

    /// Overwrite `x` with the solution of the factored system with right-hand side `x`
    pub fn solve_in_place(&self, mut x: ArrayViewMut1<'_, T>) -> Result<()> {
        let factors = self.factors()?;
        check_len(self.perm_c.len(), x.len())?;
        match x.as_slice_mut() {
            Some(rhs) => self.engine.solve(factors, &self.perm_r, &self.perm_c, rhs),
            None => {
                let mut rhs = x.to_vec();
                self.engine.solve(factors, &self.perm_r, &self.perm_c, &mut rhs);
                for (dst, src) in x.iter_mut().zip(rhs) {
                    *dst = src;
                }
            }
        }
        Ok(())
    }

    fn factors(&self) -> Result<&E::Factors> {
        self.factors.as_ref().ok_or(OperatorError::NotFactored)
    }

    /// Whether factors are present
    pub fn is_factored(&self) -> bool {
        self.factors.is_some()
    }

    /// Matrix the current factors belong to
    pub fn target(&self) -> Option<FactoredTarget<T>> {
        self.target
    }

    /// Row permutation of the last factorization: row `i` went to position `perm_r[i]`
    pub fn row_permutation(&self) -> &[usize] {
        &self.perm_r
    }

    /// Column ordering of the last factorization
    pub fn column_permutation(&self) -> &[usize] {
        &self.perm_c
    }

    /// Statistics of the current factors
    pub fn stats(&self) -> Option<FactorStats> {
        self.stats
    }

    /// Engine used for factorization
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Ordering strategy
    pub fn ordering(&self) -> &ColumnOrdering {
        &self.ordering
    }

    /// Pivot threshold passed to the engine
    pub fn pivot_threshold(&self) -> f64 {
        self.pivot_threshold
    }
}

fn square_storage<T: ComplexField>(matrix: &CscMatrix<T>) -> Result<&CscStorage<T>> {
    let a = matrix.storage()?;
    if !a.is_square() {
        return Err(OperatorError::NotSquare {
            rows: a.nrows,
            cols: a.ncols,
        });
    }
    Ok(a)
}

/// Translate an engine status code for an `n x n` factorization
fn status_to_error(info: FactorStatus, n: usize) -> OperatorError {
    let n_code = n as FactorStatus;
    if info < 0 {
        OperatorError::InvalidParameter { argument: -info }
    } else if info > n_code {
        OperatorError::MemoryOverflow {
            requested: (info - n_code) as usize,
        }
    } else if info > 0 {
        OperatorError::SingularMatrix {
            column: info as usize,
        }
    } else {
        // An engine must not report failure with a success code
        OperatorError::InvalidParameter { argument: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Tridiagonal (−1, 2, −1) of size n
    fn laplacian(n: usize) -> CscMatrix<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0));
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
                triplets.push((i + 1, i, -1.0));
            }
        }
        let storage = CscStorage::from_triplets(n, n, triplets).expect("valid triplets");
        CscMatrix::try_from(storage).expect("valid storage")
    }

    fn handle() -> FactorizationHandle<f64> {
        FactorizationHandle::new(SparseLu::new(), ColumnOrdering::default(), 0.1)
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_to_error(-3, 4),
            OperatorError::InvalidParameter { argument: 3 }
        ));
        assert!(matches!(
            status_to_error(2, 4),
            OperatorError::SingularMatrix { column: 2 }
        ));
        assert!(matches!(
            status_to_error(4, 4),
            OperatorError::SingularMatrix { column: 4 }
        ));
        assert!(matches!(
            status_to_error(10, 4),
            OperatorError::MemoryOverflow { requested: 6 }
        ));
    }

    #[test]
    fn test_factor_and_solve() {
        let a = laplacian(5);
        let mut h = handle();
        h.reserve(5);
        h.factor(&a).expect("laplacian is non-singular");
        assert!(h.is_factored());
        assert_eq!(h.target(), Some(FactoredTarget::Original));

        let b = array![1.0, 0.0, 0.0, 0.0, 1.0];
        let x = h.solve(&b).expect("factored");
        let ax = a.multiply(&x).expect("defined");
        for i in 0..5 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-12);
        }
        assert!(h.stats().is_some());
    }

    #[test]
    fn test_factor_shifted_records_sigma() {
        let a = laplacian(4);
        let mut h = handle();
        h.factor_shifted(&a, 0.5).expect("shift is not an eigenvalue");
        assert_eq!(h.target(), Some(FactoredTarget::Shifted(0.5)));

        // (A − 0.5 I) x = b
        let b = array![1.0, 2.0, 3.0, 4.0];
        let x = h.solve(&b).expect("factored");
        let ax = a.multiply(&x).expect("defined");
        for i in 0..4 {
            assert_relative_eq!(ax[i] - 0.5 * x[i], b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_solve_before_factor() {
        let h = handle();
        let b = array![1.0, 2.0];
        assert!(matches!(h.solve(&b), Err(OperatorError::NotFactored)));
    }

    #[test]
    fn test_singular_leaves_unfactored() {
        let a = laplacian(3);
        let mut h = handle();
        h.factor(&a).expect("non-singular");

        // Row 1 is all zeros
        let singular = CscMatrix::try_from(
            CscStorage::from_triplets(3, 3, vec![(0, 0, 1.0), (2, 1, 1.0), (2, 2, 1.0)])
                .expect("valid triplets"),
        )
        .expect("valid storage");
        let err = h.factor(&singular).expect_err("singular matrix");
        assert!(matches!(err, OperatorError::SingularMatrix { .. }));
        assert!(!h.is_factored());
        assert_eq!(h.target(), None);
        assert!(matches!(
            h.solve(&array![1.0, 1.0, 1.0]),
            Err(OperatorError::NotFactored)
        ));
    }

    #[test]
    fn test_undefined_and_rectangular() {
        let mut h = handle();
        let undefined = CscMatrix::new();
        assert!(matches!(h.factor(&undefined), Err(OperatorError::UndefinedMatrix)));

        let rect = CscMatrix::try_from(CscStorage::<f64>::zeros(3, 2)).expect("valid storage");
        assert!(matches!(
            h.factor_shifted(&rect, 1.0),
            Err(OperatorError::NotSquare { rows: 3, cols: 2 })
        ));
    }

    #[test]
    fn test_invalid_threshold_maps_to_invalid_parameter() {
        let a = laplacian(3);
        let mut h: FactorizationHandle<f64> =
            FactorizationHandle::new(SparseLu::new(), ColumnOrdering::Natural, 2.0);
        assert!(matches!(
            h.factor(&a),
            Err(OperatorError::InvalidParameter { argument: 2 })
        ));
    }

    #[test]
    fn test_solve_into_strided_output() {
        let a = laplacian(3);
        let mut h = handle();
        h.factor(&a).expect("non-singular");

        let v = array![1.0, 0.0, 1.0];
        let mut out = ndarray::Array2::<f64>::zeros((3, 2));
        h.solve_into(v.view(), out.column_mut(1))
            .expect("factored, strided output");
        let x = h.solve(&v).expect("factored");
        for i in 0..3 {
            assert_relative_eq!(out[[i, 1]], x[i], epsilon = 1e-14);
            assert_relative_eq!(out[[i, 0]], 0.0);
        }
    }

    #[test]
    fn test_ordering_fills_reserved_permutation() {
        let a = laplacian(5);
        let mut h = handle();
        h.reserve(5);
        let reserved = h.column_permutation().as_ptr();
        h.factor(&a).expect("non-singular");
        h.factor_shifted(&a, 0.25).expect("regular shift");
        assert_eq!(h.column_permutation().as_ptr(), reserved);
        assert_eq!(h.column_permutation().len(), 5);
    }

    #[test]
    fn test_release_drops_everything() {
        let a = laplacian(3);
        let mut h = handle();
        h.factor(&a).expect("non-singular");
        h.release();
        assert!(!h.is_factored());
        assert!(h.row_permutation().is_empty());
        assert!(h.column_permutation().is_empty());
    }
}
