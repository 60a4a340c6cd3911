//! Linear operator consumed by shift-invert eigensolvers
//!
//! [`LinearOperator`] composes a [`CscMatrix`] and a [`FactorizationHandle`].
//! It forwards the products to the matrix and the inverse to the handle, so
//! an eigensolver can drive it as `v ↦ w` once the owner has called
//! [`factor`](LinearOperator::factor) or
//! [`factor_shifted`](LinearOperator::factor_shifted).

use crate::config::OperatorConfig;
use crate::direct::{DirectSolver, FactorStats, SparseLu};
use crate::error::{OperatorError, Result};
use crate::factor::{FactoredTarget, FactorizationHandle};
use crate::loader::MatrixLoader;
use crate::sparse::{CscMatrix, CscStorage};
use crate::traits::{ComplexField, MatrixProduct};
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use std::path::Path;

/// Sparse matrix with products and a factored-system solve
#[derive(Debug)]
pub struct LinearOperator<T: ComplexField, E: DirectSolver<T> = SparseLu> {
    matrix: CscMatrix<T>,
    factorization: FactorizationHandle<T, E>,
    config: OperatorConfig,
}

impl<T: ComplexField> LinearOperator<T> {
    /// Create an undefined operator using the native engine
    pub fn new(config: OperatorConfig) -> Self {
        Self::with_engine(SparseLu::new(), config)
    }

    /// Create an operator for a square `n x n` matrix
    pub fn square(
        n: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
        config: OperatorConfig,
    ) -> Result<Self> {
        let mut op = Self::new(config);
        op.define_square(n, values, row_indices, col_ptrs)?;
        Ok(op)
    }

    /// Create an operator for an `m x n` matrix
    pub fn rectangular(
        m: usize,
        n: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
        config: OperatorConfig,
    ) -> Result<Self> {
        let mut op = Self::new(config);
        op.define_rectangular(m, n, values, row_indices, col_ptrs)?;
        Ok(op)
    }

    /// Create an operator from already-built storage
    pub fn from_storage(storage: CscStorage<T>, config: OperatorConfig) -> Result<Self> {
        let mut op = Self::new(config);
        op.define(storage)?;
        Ok(op)
    }

    /// Create an operator from a file read by `loader`
    pub fn from_loader<L>(loader: &L, path: impl AsRef<Path>, config: OperatorConfig) -> Result<Self>
    where
        L: MatrixLoader<T> + ?Sized,
    {
        let mut op = Self::new(config);
        op.load(loader, path)?;
        Ok(op)
    }
}

impl<T: ComplexField, E: DirectSolver<T>> LinearOperator<T, E> {
    /// Create an undefined operator around a custom engine
    pub fn with_engine(engine: E, config: OperatorConfig) -> Self {
        let factorization =
            FactorizationHandle::new(engine, config.ordering.clone(), config.pivot_threshold);
        Self {
            matrix: CscMatrix::new(),
            factorization,
            config,
        }
    }

    /// Define a square matrix, reserving permutation storage for factorization.
    ///
    /// Any previous factorization is dropped. On failure the operator keeps
    /// its previous definition.
    pub fn define_square(
        &mut self,
        n: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
    ) -> Result<()> {
        self.matrix
            .define_square(n, values, row_indices, col_ptrs, self.config.check_structure)?;
        self.factorization.reserve(n);
        Ok(())
    }

    /// Define a rectangular matrix; it can be multiplied but not factored
    pub fn define_rectangular(
        &mut self,
        m: usize,
        n: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
    ) -> Result<()> {
        self.matrix
            .define_rectangular(m, n, values, row_indices, col_ptrs, self.config.check_structure)?;
        self.factorization.release();
        Ok(())
    }

    /// Define the matrix from storage, square or rectangular by shape
    pub fn define(&mut self, storage: CscStorage<T>) -> Result<()> {
        let square = storage.is_square();
        let n = storage.ncols;
        self.matrix.define(storage, self.config.check_structure)?;
        if square {
            self.factorization.reserve(n);
        } else {
            self.factorization.release();
        }
        Ok(())
    }

    /// Define the matrix from a file read by `loader`.
    ///
    /// Loader failures are reported as [`OperatorError::CannotReadFile`].
    pub fn load<L>(&mut self, loader: &L, path: impl AsRef<Path>) -> Result<()>
    where
        L: MatrixLoader<T> + ?Sized,
    {
        let path = path.as_ref();
        let storage = loader
            .load(path)
            .map_err(|source| OperatorError::CannotReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        self.define(storage)
    }

    /// Return to the undefined state, dropping matrix and factors
    pub fn clear(&mut self) {
        self.matrix.clear();
        self.factorization.release();
    }

    /// Compute `A·v`
    pub fn multiply(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.matrix.multiply(v)
    }

    /// Compute `Aᵗ·v`
    pub fn multiply_transpose(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.matrix.multiply_transpose(v)
    }

    /// Compute `AᵗA·v`
    pub fn multiply_normal(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.matrix.multiply_normal(v)
    }

    /// Compute `AAᵗ·v`
    pub fn multiply_gram(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.matrix.multiply_gram(v)
    }

    /// Compute `[0 A; Aᵗ 0]·v`
    pub fn multiply_bordered(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.matrix.multiply_bordered(v)
    }

    /// Compute `w = A·v`
    pub fn multiply_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        self.matrix.multiply_into(v, w)
    }

    /// Compute `w = Aᵗ·v`
    pub fn multiply_transpose_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        self.matrix.multiply_transpose_into(v, w)
    }

    /// Compute `w = AᵗA·v`
    pub fn multiply_normal_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        self.matrix.multiply_normal_into(v, w)
    }

    /// Compute `w = AAᵗ·v`
    pub fn multiply_gram_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        self.matrix.multiply_gram_into(v, w)
    }

    /// Compute `w = [0 A; Aᵗ 0]·v`
    pub fn multiply_bordered_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        self.matrix.multiply_bordered_into(v, w)
    }

    /// Factor `A`
    pub fn factor(&mut self) -> Result<()> {
        self.factorization.factor(&self.matrix)
    }

    /// Factor `A − σI`
    pub fn factor_shifted(&mut self, sigma: T) -> Result<()> {
        self.factorization.factor_shifted(&self.matrix, sigma)
    }

    /// Solve with the current factors: `(A or A − σI)⁻¹·v`
    pub fn apply_inverse(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.factorization.solve(v)
    }

    /// Write `(A or A − σI)⁻¹·v` into `w`
    pub fn apply_inverse_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        self.factorization.solve_into(v, w)
    }

    /// Overwrite `x` with `(A or A − σI)⁻¹·x`
    pub fn apply_inverse_in_place(&self, x: ArrayViewMut1<'_, T>) -> Result<()> {
        self.factorization.solve_in_place(x)
    }

    /// The wrapped matrix
    pub fn matrix(&self) -> &CscMatrix<T> {
        &self.matrix
    }

    /// The factorization state
    pub fn factorization(&self) -> &FactorizationHandle<T, E> {
        &self.factorization
    }

    /// Settings this operator was created with
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Whether a matrix is defined
    pub fn is_defined(&self) -> bool {
        self.matrix.is_defined()
    }

    /// Whether factors are available for `apply_inverse`
    pub fn is_factored(&self) -> bool {
        self.factorization.is_factored()
    }

    /// Matrix the current factors belong to
    pub fn factored_target(&self) -> Option<FactoredTarget<T>> {
        self.factorization.target()
    }

    /// Statistics of the current factors
    pub fn factor_stats(&self) -> Option<FactorStats> {
        self.factorization.stats()
    }

    /// Number of rows (0 while undefined)
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of columns (0 while undefined)
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Number of stored non-zeros (0 while undefined)
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Whether the defined matrix is square
    pub fn is_square(&self) -> bool {
        self.matrix.is_square()
    }
}

/// Copies the matrix but not the factors: the copy is unfactored and must be
/// factored again before `apply_inverse`.
impl<T: ComplexField, E: DirectSolver<T> + Clone> Clone for LinearOperator<T, E> {
    fn clone(&self) -> Self {
        if self.is_factored() {
            log::debug!(
                "cloning a factored {}x{} operator; the copy is unfactored",
                self.nrows(),
                self.ncols()
            );
        }
        let mut factorization = FactorizationHandle::new(
            self.factorization.engine().clone(),
            self.config.ordering.clone(),
            self.config.pivot_threshold,
        );
        if self.is_square() {
            factorization.reserve(self.ncols());
        }
        Self {
            matrix: self.matrix.clone(),
            factorization,
            config: self.config.clone(),
        }
    }
}

impl<T: ComplexField, E: DirectSolver<T>> MatrixProduct<T> for LinearOperator<T, E> {
    fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    fn multiply_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        self.matrix.multiply_into(v, w)
    }

    fn multiply_transpose_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        self.matrix.multiply_transpose_into(v, w)
    }
}
