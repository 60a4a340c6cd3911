//! Compressed Sparse Column (CSC) matrix format
//!
//! CSC format stores:
//! - `values`: Non-zero entries in column-major order
//! - `row_indices`: Row index for each value, strictly increasing within a column
//! - `col_ptrs`: Index into values/row_indices where each column starts
//!
//! All indices are 0-based. This is the layout handed to the direct solver,
//! so it is never converted to 1-based form anywhere in the crate.

use crate::error::{OperatorError, Result, StructuralDefect};
use crate::traits::{ComplexField, MatrixProduct, check_len};
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, Axis};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Column count above which the transpose product runs in parallel.
#[cfg(feature = "rayon")]
const PARALLEL_MIN_COLS: usize = 256;

/// Owned compressed-column arrays.
///
/// Built through [`CscStorage::from_parts`], [`CscStorage::from_triplets`] or
/// [`CscStorage::from_dense`], which always check array lengths and the
/// first/last column pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct CscStorage<T: ComplexField> {
    /// Number of rows
    pub nrows: usize,
    /// Number of columns
    pub ncols: usize,
    /// Non-zero values in column-major order
    pub values: Vec<T>,
    /// Row index of each value
    pub row_indices: Vec<usize>,
    /// Column pointers: col_ptrs[j] is the start index in values/row_indices for column j
    /// col_ptrs[ncols] = nnz (total number of non-zeros)
    pub col_ptrs: Vec<usize>,
}

impl<T: ComplexField> CscStorage<T> {
    /// Create an all-zero matrix with no stored entries
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            values: Vec::new(),
            row_indices: Vec::new(),
            col_ptrs: vec![0; ncols + 1],
        }
    }

    /// Bind raw compressed-column arrays.
    ///
    /// Array lengths and the first/last column pointer are always checked.
    /// When `validate` is set, the column pointers must also be
    /// non-decreasing and every column's row indices strictly increasing and
    /// below `nrows`. Skipping validation is only sound for trusted input:
    /// malformed arrays then make the products panic on out-of-range access.
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
        validate: bool,
    ) -> Result<Self> {
        let storage = Self {
            nrows,
            ncols,
            values,
            row_indices,
            col_ptrs,
        };
        storage.check_lengths()?;
        if validate {
            storage.check_structure()?;
        }
        Ok(storage)
    }

    /// Create a CSC matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Result<Self> {
        for &(row, col, _) in &triplets {
            if col >= ncols {
                return Err(StructuralDefect::ColumnIndexOutOfBounds { column: col, ncols }.into());
            }
            if row >= nrows {
                return Err(StructuralDefect::RowIndexOutOfBounds {
                    column: col,
                    row,
                    nrows,
                }
                .into());
            }
        }

        // Sort by column, then by row
        triplets.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut row_indices = Vec::with_capacity(triplets.len());
        let mut col_ptrs = vec![0usize; ncols + 1];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if last == Some((row, col)) {
                if let Some(prev) = values.last_mut() {
                    *prev += val;
                }
                continue;
            }
            values.push(val);
            row_indices.push(row);
            col_ptrs[col + 1] += 1;
            last = Some((row, col));
        }

        for j in 0..ncols {
            col_ptrs[j + 1] += col_ptrs[j];
        }

        Ok(Self {
            nrows,
            ncols,
            values,
            row_indices,
            col_ptrs,
        })
    }

    /// Create a CSC matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let nrows = dense.nrows();
        let ncols = dense.ncols();

        let mut values = Vec::new();
        let mut row_indices = Vec::new();
        let mut col_ptrs = Vec::with_capacity(ncols + 1);
        col_ptrs.push(0);

        for column in dense.axis_iter(Axis(1)) {
            for (i, &val) in column.iter().enumerate() {
                if val.norm() > threshold {
                    values.push(val);
                    row_indices.push(i);
                }
            }
            col_ptrs.push(values.len());
        }

        Self {
            nrows,
            ncols,
            values,
            row_indices,
            col_ptrs,
        }
    }

    /// Create identity matrix in CSC format
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            values: vec![T::one(); n],
            row_indices: (0..n).collect(),
            col_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Whether the matrix is square
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Get the range of indices in values/row_indices for a given column
    pub fn col_range(&self, col: usize) -> Range<usize> {
        self.col_ptrs[col]..self.col_ptrs[col + 1]
    }

    /// Get the (row, value) pairs for a column
    pub fn col_entries(&self, col: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.col_range(col);
        self.row_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.col_range(j);
        match self.row_indices[range.clone()].binary_search(&i) {
            Ok(offset) => self.values[range.start + offset],
            Err(_) => T::zero(),
        }
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.nrows, self.ncols), T::zero());
        for j in 0..self.ncols {
            for (i, val) in self.col_entries(j) {
                dense[[i, j]] = val;
            }
        }
        dense
    }

    /// Check the array lengths and the first/last column pointer.
    pub fn check_lengths(&self) -> std::result::Result<(), StructuralDefect> {
        if self.col_ptrs.len() != self.ncols + 1 {
            return Err(StructuralDefect::ColumnPointerLength {
                expected: self.ncols + 1,
                got: self.col_ptrs.len(),
            });
        }
        if self.values.len() != self.row_indices.len() {
            return Err(StructuralDefect::ValueLength {
                values: self.values.len(),
                row_indices: self.row_indices.len(),
            });
        }
        if self.col_ptrs[0] != 0 {
            return Err(StructuralDefect::FirstColumnPointer(self.col_ptrs[0]));
        }
        let last = self.col_ptrs[self.ncols];
        if last != self.nnz() {
            return Err(StructuralDefect::LastColumnPointer {
                nnz: self.nnz(),
                got: last,
            });
        }
        Ok(())
    }

    /// Check pointer monotonicity, row bounds and row ordering.
    ///
    /// Assumes [`check_lengths`](Self::check_lengths) already passed.
    pub fn check_structure(&self) -> std::result::Result<(), StructuralDefect> {
        for column in 0..self.ncols {
            if self.col_ptrs[column] > self.col_ptrs[column + 1] {
                return Err(StructuralDefect::DecreasingColumnPointers { column });
            }
        }

        for column in 0..self.ncols {
            let rows = &self.row_indices[self.col_range(column)];
            if let Some(&row) = rows.iter().find(|&&row| row >= self.nrows) {
                return Err(StructuralDefect::RowIndexOutOfBounds {
                    column,
                    row,
                    nrows: self.nrows,
                });
            }
            if rows.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(StructuralDefect::UnsortedRows { column });
            }
        }

        Ok(())
    }

    /// w = A·v, single pass over the columns scattering into w
    pub(crate) fn gemv_into(&self, v: ArrayView1<'_, T>, mut w: ArrayViewMut1<'_, T>) {
        w.fill(T::zero());
        for j in 0..self.ncols {
            let t = v[j];
            for idx in self.col_range(j) {
                w[self.row_indices[idx]] += t * self.values[idx];
            }
        }
    }

    /// w = Aᵗ·v, one dot product per column
    pub(crate) fn gemv_transpose_into(&self, v: ArrayView1<'_, T>, mut w: ArrayViewMut1<'_, T>) {
        #[cfg(feature = "rayon")]
        {
            if self.ncols >= PARALLEL_MIN_COLS {
                if let Some(out) = w.as_slice_mut() {
                    out.par_iter_mut()
                        .enumerate()
                        .for_each(|(j, wj)| *wj = self.column_dot(j, &v));
                    return;
                }
            }
        }

        for j in 0..self.ncols {
            w[j] = self.column_dot(j, &v);
        }
    }

    #[inline]
    fn column_dot(&self, col: usize, v: &ArrayView1<'_, T>) -> T {
        let mut t = T::zero();
        for idx in self.col_range(col) {
            t += v[self.row_indices[idx]] * self.values[idx];
        }
        t
    }
}

/// A compressed-column matrix that is either undefined or fully defined.
///
/// The matrix starts undefined; a `define_*` call binds validated storage.
/// Every product fails with [`OperatorError::UndefinedMatrix`] until then.
#[derive(Debug, Clone)]
pub struct CscMatrix<T: ComplexField> {
    storage: Option<CscStorage<T>>,
}

impl<T: ComplexField> Default for CscMatrix<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ComplexField> TryFrom<CscStorage<T>> for CscMatrix<T> {
    type Error = OperatorError;

    /// Bind `storage` after the full structural check
    fn try_from(storage: CscStorage<T>) -> Result<Self> {
        let mut matrix = Self::new();
        matrix.define(storage, true)?;
        Ok(matrix)
    }
}

impl<T: ComplexField> CscMatrix<T> {
    /// Create an undefined matrix
    pub fn new() -> Self {
        Self { storage: None }
    }

    /// Define a square `n x n` matrix from raw arrays
    pub fn define_square(
        &mut self,
        n: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
        validate: bool,
    ) -> Result<()> {
        self.define_rectangular(n, n, values, row_indices, col_ptrs, validate)
    }

    /// Define an `m x n` matrix from raw arrays
    ///
    /// On failure the matrix keeps whatever definition it had before.
    pub fn define_rectangular(
        &mut self,
        m: usize,
        n: usize,
        values: Vec<T>,
        row_indices: Vec<usize>,
        col_ptrs: Vec<usize>,
        validate: bool,
    ) -> Result<()> {
        let storage = CscStorage::from_parts(m, n, values, row_indices, col_ptrs, validate)?;
        self.storage = Some(storage);
        Ok(())
    }

    /// Define the matrix from already-built storage
    pub fn define(&mut self, storage: CscStorage<T>, validate: bool) -> Result<()> {
        storage.check_lengths()?;
        if validate {
            storage.check_structure()?;
        }
        self.storage = Some(storage);
        Ok(())
    }

    /// Drop the bound storage, returning the matrix to the undefined state
    pub fn clear(&mut self) {
        self.storage = None;
    }

    /// Re-run the full structural check on the bound arrays
    pub fn validate(&self) -> Result<()> {
        let storage = self.storage()?;
        storage.check_lengths()?;
        storage.check_structure()?;
        Ok(())
    }

    /// Borrow the bound storage
    pub fn storage(&self) -> Result<&CscStorage<T>> {
        self.storage.as_ref().ok_or(OperatorError::UndefinedMatrix)
    }

    /// Whether storage is bound
    pub fn is_defined(&self) -> bool {
        self.storage.is_some()
    }

    /// Number of rows (0 while undefined)
    pub fn nrows(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.nrows)
    }

    /// Number of columns (0 while undefined)
    pub fn ncols(&self) -> usize {
        self.storage.as_ref().map_or(0, |s| s.ncols)
    }

    /// Number of stored non-zeros (0 while undefined)
    pub fn nnz(&self) -> usize {
        self.storage.as_ref().map_or(0, CscStorage::nnz)
    }

    /// Whether the defined matrix is square
    pub fn is_square(&self) -> bool {
        self.storage.as_ref().is_some_and(CscStorage::is_square)
    }

    /// Compute `w = A·v`
    pub fn multiply_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        let a = self.storage()?;
        check_len(a.ncols, v.len())?;
        check_len(a.nrows, w.len())?;
        a.gemv_into(v, w);
        Ok(())
    }

    /// Compute `w = Aᵗ·v`
    pub fn multiply_transpose_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        let a = self.storage()?;
        check_len(a.nrows, v.len())?;
        check_len(a.ncols, w.len())?;
        a.gemv_transpose_into(v, w);
        Ok(())
    }

    /// Compute `w = AᵗA·v` through one temporary of length `m`
    pub fn multiply_normal_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        let a = self.storage()?;
        check_len(a.ncols, v.len())?;
        check_len(a.ncols, w.len())?;
        let mut t = Array1::from_elem(a.nrows, T::zero());
        a.gemv_into(v, t.view_mut());
        a.gemv_transpose_into(t.view(), w);
        Ok(())
    }

    /// Compute `w = AAᵗ·v` through one temporary of length `n`
    pub fn multiply_gram_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        let a = self.storage()?;
        check_len(a.nrows, v.len())?;
        check_len(a.nrows, w.len())?;
        let mut t = Array1::from_elem(a.ncols, T::zero());
        a.gemv_transpose_into(v, t.view_mut());
        a.gemv_into(t.view(), w);
        Ok(())
    }

    /// Compute the bordered product `w = [0 A; Aᵗ 0]·v`.
    ///
    /// `v` and `w` have length `m + n`. With `v = [v1; v2]` (`v1` of length
    /// `m`), the result is `[A·v2; Aᵗ·v1]`.
    pub fn multiply_bordered_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        let a = self.storage()?;
        let len = a.nrows + a.ncols;
        check_len(len, v.len())?;
        check_len(len, w.len())?;
        let (v1, v2) = v.split_at(Axis(0), a.nrows);
        let (w1, w2) = w.split_at(Axis(0), a.nrows);
        a.gemv_into(v2, w1);
        a.gemv_transpose_into(v1, w2);
        Ok(())
    }

    /// Compute `A·v`
    pub fn multiply(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = Array1::from_elem(self.storage()?.nrows, T::zero());
        self.multiply_into(v.view(), w.view_mut())?;
        Ok(w)
    }

    /// Compute `Aᵗ·v`
    pub fn multiply_transpose(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = Array1::from_elem(self.storage()?.ncols, T::zero());
        self.multiply_transpose_into(v.view(), w.view_mut())?;
        Ok(w)
    }

    /// Compute `AᵗA·v`
    pub fn multiply_normal(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = Array1::from_elem(self.storage()?.ncols, T::zero());
        self.multiply_normal_into(v.view(), w.view_mut())?;
        Ok(w)
    }

    /// Compute `AAᵗ·v`
    pub fn multiply_gram(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = Array1::from_elem(self.storage()?.nrows, T::zero());
        self.multiply_gram_into(v.view(), w.view_mut())?;
        Ok(w)
    }

    /// Compute `[0 A; Aᵗ 0]·v`
    pub fn multiply_bordered(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let a = self.storage()?;
        let mut w = Array1::from_elem(a.nrows + a.ncols, T::zero());
        self.multiply_bordered_into(v.view(), w.view_mut())?;
        Ok(w)
    }
}

impl<T: ComplexField> MatrixProduct<T> for CscMatrix<T> {
    fn nrows(&self) -> usize {
        CscMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        CscMatrix::ncols(self)
    }

    fn multiply_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        CscMatrix::multiply_into(self, v, w)
    }

    fn multiply_transpose_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        CscMatrix::multiply_transpose_into(self, v, w)
    }
}
