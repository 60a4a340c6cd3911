//! Direct sparse solvers
//!
//! The factorization handle talks to a direct solver only through
//! [`DirectSolver`], the contract of a SuperLU-style engine:
//! - one factor call taking a compressed-column matrix, a pivot threshold and
//!   a precomputed column ordering, returning triangular factors and filling
//!   the row permutation, or an integer status code;
//! - one in-place triangular solve;
//! - a per-call workspace carrying statistics, created before and dropped
//!   after each factorization.
//!
//! [`SparseLu`] is the native engine used by default.

mod sparse_lu;

pub use sparse_lu::{LuFactors, LuWorkspace, SparseLu};

use crate::sparse::CscStorage;
use crate::traits::ComplexField;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status code type returned by a failed factorization.
///
/// - `-k`: argument `k` was illegal
/// - `1..=n`: zero pivot in (1-based) column `k`
/// - `> n`: the engine ran out of memory after allocating `code - n` entries
pub type FactorStatus = i64;

/// A SuperLU-style sparse direct solver.
pub trait DirectSolver<T: ComplexField> {
    /// Triangular factors produced by [`factor`](Self::factor)
    type Factors;

    /// Scratch space and statistics for one factorization call
    type Workspace;

    /// Create the workspace for an `n x n` factorization
    fn workspace(&self, n: usize) -> Self::Workspace;

    /// Factor `matrix` with columns taken in the order `perm_c`.
    ///
    /// On success `perm_r[i]` holds the pivot position of original row `i`.
    fn factor(
        &self,
        workspace: &mut Self::Workspace,
        matrix: &CscStorage<T>,
        pivot_threshold: f64,
        perm_c: &[usize],
        perm_r: &mut [usize],
    ) -> Result<Self::Factors, FactorStatus>;

    /// Overwrite `rhs` with the solution of the factored system
    fn solve(&self, factors: &Self::Factors, perm_r: &[usize], perm_c: &[usize], rhs: &mut [T]);

    /// Statistics gathered in `workspace` by the last factor call
    fn stats(&self, workspace: &Self::Workspace) -> FactorStats;
}

/// Statistics from one factorization, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorStats {
    /// Number of non-zeros in the factored matrix
    pub original_nnz: usize,
    /// Number of non-zeros in L (unit diagonal included)
    pub l_nnz: usize,
    /// Number of non-zeros in U
    pub u_nnz: usize,
    /// Columns whose pivot was taken off the diagonal
    pub row_interchanges: usize,
}

impl FactorStats {
    /// Fill ratio: (l_nnz + u_nnz) / original_nnz
    pub fn fill_ratio(&self) -> f64 {
        if self.original_nnz == 0 {
            0.0
        } else {
            (self.l_nnz + self.u_nnz) as f64 / self.original_nnz as f64
        }
    }
}
