//! Other storage kinds behind [`MatrixProduct`]
//!
//! - [`DenseMatrix`]: an ndarray `Array2` wrapper
//! - [`ProductMatrix`]: the product `A·B` of two operators, applied
//!   right to left without forming it

use crate::error::{OperatorError, Result};
use crate::traits::{ComplexField, MatrixProduct, check_len};
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};

/// Dense matrix exposed through [`MatrixProduct`]
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: ComplexField>(pub Array2<T>);

impl<T: ComplexField> From<Array2<T>> for DenseMatrix<T> {
    fn from(matrix: Array2<T>) -> Self {
        Self(matrix)
    }
}

impl<T: ComplexField> MatrixProduct<T> for DenseMatrix<T> {
    fn nrows(&self) -> usize {
        self.0.nrows()
    }

    fn ncols(&self) -> usize {
        self.0.ncols()
    }

    fn multiply_into(&self, v: ArrayView1<'_, T>, mut w: ArrayViewMut1<'_, T>) -> Result<()> {
        check_len(self.ncols(), v.len())?;
        check_len(self.nrows(), w.len())?;
        general_mat_vec_mul(T::one(), &self.0, &v, T::zero(), &mut w);
        Ok(())
    }

    fn multiply_transpose_into(
        &self,
        v: ArrayView1<'_, T>,
        mut w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        check_len(self.nrows(), v.len())?;
        check_len(self.ncols(), w.len())?;
        general_mat_vec_mul(T::one(), &self.0.t(), &v, T::zero(), &mut w);
        Ok(())
    }
}

/// The product `A·B`, applied as `A·(B·v)`
#[derive(Debug, Clone)]
pub struct ProductMatrix<A, B> {
    a: A,
    b: B,
}

impl<A, B> ProductMatrix<A, B> {
    /// Compose `a·b`; the inner dimensions must agree
    pub fn new<T>(a: A, b: B) -> Result<Self>
    where
        T: ComplexField,
        A: MatrixProduct<T>,
        B: MatrixProduct<T>,
    {
        if a.ncols() != b.nrows() {
            return Err(OperatorError::DimensionMismatch {
                expected: a.ncols(),
                got: b.nrows(),
            });
        }
        Ok(Self { a, b })
    }

    /// Left factor
    pub fn left(&self) -> &A {
        &self.a
    }

    /// Right factor
    pub fn right(&self) -> &B {
        &self.b
    }

    /// Split into the two factors
    pub fn into_parts(self) -> (A, B) {
        (self.a, self.b)
    }
}

impl<T, A, B> MatrixProduct<T> for ProductMatrix<A, B>
where
    T: ComplexField,
    A: MatrixProduct<T>,
    B: MatrixProduct<T>,
{
    fn nrows(&self) -> usize {
        self.a.nrows()
    }

    fn ncols(&self) -> usize {
        self.b.ncols()
    }

    fn multiply_into(&self, v: ArrayView1<'_, T>, w: ArrayViewMut1<'_, T>) -> Result<()> {
        let mut t = Array1::from_elem(self.b.nrows(), T::zero());
        self.b.multiply_into(v, t.view_mut())?;
        self.a.multiply_into(t.view(), w)
    }

    /// `(A·B)ᵗ·v = Bᵗ·(Aᵗ·v)`
    fn multiply_transpose_into(
        &self,
        v: ArrayView1<'_, T>,
        w: ArrayViewMut1<'_, T>,
    ) -> Result<()> {
        let mut t = Array1::from_elem(self.a.ncols(), T::zero());
        self.a.multiply_transpose_into(v, t.view_mut())?;
        self.b.multiply_transpose_into(t.view(), w)
    }
}
