//! Error types for sparse operator definition, factorization and solves.
//!
//! Every failure is reported once, at the point where it is detected, and is
//! never retried internally. Status codes returned by a [`DirectSolver`]
//! are translated into [`OperatorError`] variants by the factorization handle.
//!
//! [`DirectSolver`]: crate::direct::DirectSolver

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by compressed-column matrices and the operators built on them.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// The operation needs a defined matrix but no storage is bound.
    #[error("matrix data is undefined")]
    UndefinedMatrix,

    /// Factorization was requested on a rectangular matrix.
    #[error("matrix is not square: {rows} x {cols}")]
    NotSquare {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// The compressed-column arrays violate a structural invariant.
    #[error("inconsistent compressed-column data: {0}")]
    Structural(#[from] StructuralDefect),

    /// The direct solver rejected one of its arguments.
    #[error("direct solver rejected argument {argument}")]
    InvalidParameter {
        /// Position of the offending argument, as reported by the solver
        argument: i64,
    },

    /// The direct solver ran out of working memory.
    #[error("direct solver ran out of memory after {requested} factor entries")]
    MemoryOverflow {
        /// Amount of factor storage in use when the solver gave up
        requested: usize,
    },

    /// The (shifted) matrix is singular.
    #[error("matrix is singular: zero pivot in column {column}")]
    SingularMatrix {
        /// 1-based column at which elimination found no usable pivot
        column: usize,
    },

    /// A solve was requested before a successful factorization.
    #[error("matrix has not been factored")]
    NotFactored,

    /// The matrix loader could not produce the arrays.
    #[error("cannot read matrix file {}", .path.display())]
    CannotReadFile {
        /// Path handed to the loader
        path: PathBuf,
        /// Underlying loader failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A vector argument has the wrong length.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Required length
        expected: usize,
        /// Length actually supplied
        got: usize,
    },
}

/// Which structural invariant of the compressed-column layout failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralDefect {
    /// `col_ptrs` must hold `ncols + 1` entries.
    #[error("column pointer array has {got} entries, expected {expected}")]
    ColumnPointerLength {
        /// `ncols + 1`
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// `values` and `row_indices` must both hold `nnz` entries.
    #[error("{values} values but {row_indices} row indices")]
    ValueLength {
        /// Length of the value array
        values: usize,
        /// Length of the row index array
        row_indices: usize,
    },

    /// `col_ptrs[0]` must be zero.
    #[error("first column pointer is {0}, expected 0")]
    FirstColumnPointer(usize),

    /// `col_ptrs[ncols]` must equal `nnz`.
    #[error("last column pointer is {got}, expected nnz = {nnz}")]
    LastColumnPointer {
        /// Stored non-zero count
        nnz: usize,
        /// Value of the final column pointer
        got: usize,
    },

    /// Column pointers must be non-decreasing.
    #[error("column pointers decrease at column {column}")]
    DecreasingColumnPointers {
        /// Column whose end precedes its start
        column: usize,
    },

    /// A row index falls outside `[0, nrows)`.
    #[error("row index {row} in column {column} is out of bounds for {nrows} rows")]
    RowIndexOutOfBounds {
        /// Column holding the entry
        column: usize,
        /// Offending row index
        row: usize,
        /// Number of rows
        nrows: usize,
    },

    /// A column index (in triplet input) falls outside `[0, ncols)`.
    #[error("column index {column} is out of bounds for {ncols} columns")]
    ColumnIndexOutOfBounds {
        /// Offending column index
        column: usize,
        /// Number of columns
        ncols: usize,
    },

    /// Row indices within a column must be strictly increasing.
    #[error("row indices of column {column} are not strictly increasing")]
    UnsortedRows {
        /// Column with unsorted or duplicated rows
        column: usize,
    },
}

/// A specialized `Result` type for operator operations.
pub type Result<T> = std::result::Result<T, OperatorError>;

impl OperatorError {
    /// Returns `true` if the error came from the direct factorization.
    ///
    /// This includes `InvalidParameter`, `MemoryOverflow` and `SingularMatrix`.
    pub fn is_factorization_error(&self) -> bool {
        matches!(
            self,
            OperatorError::InvalidParameter { .. }
                | OperatorError::MemoryOverflow { .. }
                | OperatorError::SingularMatrix { .. }
        )
    }

    /// Returns `true` if the operation was called in the wrong state.
    ///
    /// This includes `UndefinedMatrix` and `NotFactored`.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            OperatorError::UndefinedMatrix | OperatorError::NotFactored
        )
    }

    /// Returns `true` if the matrix data itself is malformed.
    pub fn is_structural_error(&self) -> bool {
        matches!(self, OperatorError::Structural(_))
    }
}
