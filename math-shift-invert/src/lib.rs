//! Sparse shift-invert operators for iterative eigensolvers
//!
//! This crate represents a sparse matrix in compressed-column form, builds the
//! shifted matrix `A − σI` on demand, factors it with a sparse direct solver
//! and exposes the products and the factored solve an iterative (Krylov)
//! eigensolver drives in its shift-invert mode.
//!
//! # Features
//!
//! - **Compressed-column storage**: validated CSC arrays with `A·v`, `Aᵗ·v`,
//!   `AᵗA·v`, `AAᵗ·v` and bordered `[0 A; Aᵗ 0]·v` products
//! - **Shift builder**: `A − σI` in one merge pass, synthesizing missing
//!   diagonal entries
//! - **Direct solver seam**: [`DirectSolver`] trait with a native left-looking
//!   sparse LU ([`SparseLu`]) and pluggable fill-reducing orderings
//! - **Operators**: [`LinearOperator`] and the generalized [`Pencil`]
//! - **Generic Scalar Types**: Works with Complex64, Complex32, f64, f32
//!
//! All indices are 0-based.
//!
//! # Example
//!
//! ```
//! use math_audio_shift_invert::{LinearOperator, OperatorConfig};
//! use ndarray::array;
//!
//! // [ 2 -1  0]
//! // [-1  2 -1]
//! // [ 0 -1  2]
//! let mut op = LinearOperator::square(
//!     3,
//!     vec![2.0, -1.0, -1.0, 2.0, -1.0, -1.0, 2.0],
//!     vec![0, 1, 0, 1, 2, 1, 2],
//!     vec![0, 2, 5, 7],
//!     OperatorConfig::default(),
//! )?;
//!
//! op.factor_shifted(0.5)?;
//! let x = op.apply_inverse(&array![1.0, 0.0, 0.0])?;
//! assert_eq!(x.len(), 3);
//! # Ok::<(), math_audio_shift_invert::OperatorError>(())
//! ```

pub mod config;
pub mod direct;
pub mod error;
pub mod factor;
pub mod loader;
pub mod operator;
pub mod ordering;
pub mod pencil;
pub mod product;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use config::OperatorConfig;
pub use error::{OperatorError, Result, StructuralDefect};
pub use operator::LinearOperator;
pub use pencil::Pencil;
pub use sparse::{CscMatrix, CscStorage, subtract_shift_from_diagonal};
pub use traits::{ComplexField, MatrixProduct};

// Re-export factorization
pub use direct::{DirectSolver, FactorStats, FactorStatus, LuFactors, LuWorkspace, SparseLu};
pub use factor::{FactoredTarget, FactorizationHandle};
pub use ordering::ColumnOrdering;

// Re-export other capability variants and seams
pub use loader::{LoaderError, MatrixLoader};
pub use product::{DenseMatrix, ProductMatrix};
