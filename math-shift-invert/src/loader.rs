//! Matrix file loading seam
//!
//! Parsing matrix files (Harwell-Boeing, Matrix Market, ...) is left to the
//! caller. A loader only has to hand back compressed-column arrays; any
//! failure it reports becomes [`OperatorError::CannotReadFile`] in
//! [`LinearOperator::load`].
//!
//! Closures of the right shape are loaders:
//!
//! ```
//! use math_audio_shift_invert::{CscStorage, LinearOperator, LoaderError, OperatorConfig};
//! use std::path::Path;
//!
//! let loader = |_: &Path| -> Result<CscStorage<f64>, LoaderError> {
//!     Ok(CscStorage::identity(3))
//! };
//! let op: LinearOperator<f64> =
//!     LinearOperator::from_loader(&loader, "identity.rua", OperatorConfig::default())
//!         .expect("loader succeeds");
//! assert_eq!(op.nrows(), 3);
//! ```
//!
//! [`OperatorError::CannotReadFile`]: crate::OperatorError::CannotReadFile
//! [`LinearOperator::load`]: crate::LinearOperator::load

use crate::sparse::CscStorage;
use crate::traits::ComplexField;
use std::path::Path;

/// Error type loaders report
pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// Produces compressed-column arrays from a file
pub trait MatrixLoader<T: ComplexField> {
    /// Read the matrix stored at `path`
    fn load(&self, path: &Path) -> Result<CscStorage<T>, LoaderError>;
}

impl<T, F> MatrixLoader<T> for F
where
    T: ComplexField,
    F: Fn(&Path) -> Result<CscStorage<T>, LoaderError>,
{
    fn load(&self, path: &Path) -> Result<CscStorage<T>, LoaderError> {
        self(path)
    }
}
