//! Sparse matrix structures (CSC format)
//!
//! This module provides the Compressed Sparse Column (CSC) storage consumed by
//! the direct solver, and the diagonal shift used for shift-invert.

mod csc;
pub mod shift;

pub use csc::{CscMatrix, CscStorage};
pub use shift::subtract_shift_from_diagonal;
