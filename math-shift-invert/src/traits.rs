//! Core traits for scalars and matrix products
//!
//! - [`ComplexField`]: scalar types (real and complex) stored in the matrices
//! - [`MatrixProduct`]: the capability set an iterative eigensolver depends on,
//!   `w = M·v` and `w = Mᵗ·v`, independent of how the matrix is stored

use crate::error::{OperatorError, Result};
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use num_complex::{Complex32, Complex64};
use num_traits::{Float, FromPrimitive, NumAssign, One, ToPrimitive, Zero};
use std::fmt::Debug;
use std::ops::Neg;

/// Trait for scalar types that can be stored in a sparse operator.
///
/// Abstracts over real and complex numbers so that the same compressed-column
/// storage, shift and factorization code serves `f64`, `f32`, `Complex64` and
/// `Complex32` problems.
pub trait ComplexField:
    NumAssign + Clone + Copy + Send + Sync + Debug + Zero + One + Neg<Output = Self> + 'static
{
    /// The real number type underlying this field
    type Real: Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static;

    /// Squared magnitude |z|²
    fn norm_sqr(&self) -> Self::Real;

    /// Magnitude |z|
    fn norm(&self) -> Self::Real {
        self.norm_sqr().sqrt()
    }
}

impl ComplexField for Complex64 {
    type Real = f64;

    #[inline]
    fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

impl ComplexField for Complex32 {
    type Real = f32;

    #[inline]
    fn norm_sqr(&self) -> f32 {
        self.re * self.re + self.im * self.im
    }
}

impl ComplexField for f64 {
    type Real = f64;

    #[inline]
    fn norm_sqr(&self) -> f64 {
        *self * *self
    }
}

impl ComplexField for f32 {
    type Real = f32;

    #[inline]
    fn norm_sqr(&self) -> f32 {
        *self * *self
    }
}

/// Matrix-vector products consumed by an iterative eigensolver.
///
/// The eigensolver only sees this capability set; compressed-column
/// matrices, dense matrices and products of matrices all implement it.
/// Products are fallible because a storage kind may not be ready yet
/// (an undefined [`CscMatrix`](crate::CscMatrix), for instance).
pub trait MatrixProduct<T: ComplexField> {
    /// Number of rows
    fn nrows(&self) -> usize;

    /// Number of columns
    fn ncols(&self) -> usize;

    /// Compute `w = M·v` into a caller-owned buffer
    fn multiply_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()>;

    /// Compute `w = Mᵗ·v` into a caller-owned buffer
    fn multiply_transpose_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>)
    -> Result<()>;

    /// Compute `M·v`
    fn multiply(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = Array1::from_elem(self.nrows(), T::zero());
        self.multiply_into(v.view(), w.view_mut())?;
        Ok(w)
    }

    /// Compute `Mᵗ·v`
    fn multiply_transpose(&self, v: &Array1<T>) -> Result<Array1<T>> {
        let mut w = Array1::from_elem(self.ncols(), T::zero());
        self.multiply_transpose_into(v.view(), w.view_mut())?;
        Ok(w)
    }

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }
}

/// Check a vector length against the length an operation requires.
#[inline]
pub(crate) fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(OperatorError::DimensionMismatch { expected, got })
    }
}
