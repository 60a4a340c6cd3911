//! Generalized eigenproblem pencil `(A, B)` for `A·x = λ·B·x`
//!
//! A pencil owns two operators of the same square shape and exposes the
//! compositions a generalized eigensolver needs. It only goes through the
//! public operator API.

use crate::direct::{DirectSolver, SparseLu};
use crate::error::{OperatorError, Result};
use crate::operator::LinearOperator;
use crate::traits::ComplexField;
use ndarray::Array1;

/// Two operators `A` and `B` of equal square shape
#[derive(Debug)]
pub struct Pencil<T: ComplexField, E: DirectSolver<T> = SparseLu> {
    a: LinearOperator<T, E>,
    b: LinearOperator<T, E>,
}

impl<T: ComplexField, E: DirectSolver<T>> Pencil<T, E> {
    /// Pair `a` and `b`; both must be defined, square and of the same size
    pub fn new(a: LinearOperator<T, E>, b: LinearOperator<T, E>) -> Result<Self> {
        for op in [&a, &b] {
            if !op.is_defined() {
                return Err(OperatorError::UndefinedMatrix);
            }
            if !op.is_square() {
                return Err(OperatorError::NotSquare {
                    rows: op.nrows(),
                    cols: op.ncols(),
                });
            }
        }
        if a.nrows() != b.nrows() {
            return Err(OperatorError::DimensionMismatch {
                expected: a.nrows(),
                got: b.nrows(),
            });
        }
        Ok(Self { a, b })
    }

    /// Dimension of the problem
    pub fn dim(&self) -> usize {
        self.a.nrows()
    }

    /// The `A` operator
    pub fn a(&self) -> &LinearOperator<T, E> {
        &self.a
    }

    /// The `B` operator
    pub fn b(&self) -> &LinearOperator<T, E> {
        &self.b
    }

    /// Split into `(A, B)`
    pub fn into_parts(self) -> (LinearOperator<T, E>, LinearOperator<T, E>) {
        (self.a, self.b)
    }

    /// Compute `A·v`
    pub fn multiply_a(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.a.multiply(v)
    }

    /// Compute `B·v`
    pub fn multiply_b(&self, v: &Array1<T>) -> Result<Array1<T>> {
        self.b.multiply(v)
    }

    /// Factor `A − σI` for [`apply_shift_invert_b`](Self::apply_shift_invert_b)
    pub fn factor_a_shifted(&mut self, sigma: T) -> Result<()> {
        self.a.factor_shifted(sigma)
    }

    /// Factor `B` for [`apply_inverse_b_a`](Self::apply_inverse_b_a)
    pub fn factor_b(&mut self) -> Result<()> {
        self.b.factor()
    }

    /// Compute `B⁻¹·A·v` (regular mode); `B` must be factored
    pub fn apply_inverse_b_a(&self, v: &Array1<T>) -> Result<Array1<T>> {
        if !self.b.is_factored() {
            return Err(OperatorError::NotFactored);
        }
        let mut w = self.a.multiply(v)?;
        self.b.apply_inverse_in_place(w.view_mut())?;
        Ok(w)
    }

    /// Compute `(A − σI)⁻¹·B·v`; `A` must be factored
    pub fn apply_shift_invert_b(&self, v: &Array1<T>) -> Result<Array1<T>> {
        if !self.a.is_factored() {
            return Err(OperatorError::NotFactored);
        }
        let mut w = self.b.multiply(v)?;
        self.a.apply_inverse_in_place(w.view_mut())?;
        Ok(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatorConfig;
    use crate::sparse::CscStorage;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn diagonal(values: &[f64]) -> LinearOperator<f64> {
        let n = values.len();
        LinearOperator::square(
            n,
            values.to_vec(),
            (0..n).collect(),
            (0..=n).collect(),
            OperatorConfig::default(),
        )
        .expect("diagonal matrix")
    }

    #[test]
    fn test_inverse_b_a() {
        let mut pencil =
            Pencil::new(diagonal(&[2.0, 6.0]), diagonal(&[1.0, 3.0])).expect("same shape");
        let v = array![1.0, 1.0];
        assert!(matches!(
            pencil.apply_inverse_b_a(&v),
            Err(OperatorError::NotFactored)
        ));

        pencil.factor_b().expect("B is regular");
        let w = pencil.apply_inverse_b_a(&v).expect("B factored");
        // Generalized eigenvalues are 2 and 2
        assert_relative_eq!(w[0], 2.0, epsilon = 1e-14);
        assert_relative_eq!(w[1], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_shift_invert_b() {
        let mut pencil =
            Pencil::new(diagonal(&[2.0, 5.0]), diagonal(&[1.0, 2.0])).expect("same shape");
        pencil.factor_a_shifted(1.0).expect("shift is regular");

        let w = pencil.apply_shift_invert_b(&array![1.0, 1.0]).expect("A factored");
        // diag(1/(2−1), 1/(5−1))·diag(1, 2)·[1, 1]
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(w[1], 0.5, epsilon = 1e-14);
        assert_eq!(pencil.multiply_b(&array![1.0, 1.0]).expect("defined"), array![1.0, 2.0]);
    }

    #[test]
    fn test_shape_checks() {
        let result = Pencil::new(diagonal(&[1.0, 2.0]), diagonal(&[1.0, 2.0, 3.0]));
        assert!(matches!(
            result,
            Err(OperatorError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));

        let undefined = LinearOperator::new(OperatorConfig::default());
        assert!(matches!(
            Pencil::new(diagonal(&[1.0]), undefined),
            Err(OperatorError::UndefinedMatrix)
        ));

        let rect = LinearOperator::from_storage(CscStorage::zeros(2, 1), OperatorConfig::default())
            .expect("valid storage");
        assert!(matches!(
            Pencil::new(rect, diagonal(&[1.0, 2.0])),
            Err(OperatorError::NotSquare { rows: 2, cols: 1 })
        ));
    }
}
