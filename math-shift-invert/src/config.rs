//! Operator configuration

use crate::ordering::ColumnOrdering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings applied when a [`LinearOperator`](crate::LinearOperator) defines
/// and factors its matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OperatorConfig {
    /// Partial pivoting threshold in `[0, 1]`: the diagonal entry is kept as
    /// pivot when its magnitude is at least this fraction of the column maximum
    /// (0 always keeps the diagonal, 1 is classic partial pivoting)
    pub pivot_threshold: f64,
    /// Fill-reducing column ordering
    pub ordering: ColumnOrdering,
    /// Run the full structural check on newly defined arrays
    pub check_structure: bool,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            pivot_threshold: 0.1,
            ordering: ColumnOrdering::MinimumDegreeAtA,
            check_structure: true,
        }
    }
}

impl OperatorConfig {
    /// Set the pivoting threshold
    pub fn with_pivot_threshold(mut self, threshold: f64) -> Self {
        self.pivot_threshold = threshold;
        self
    }

    /// Set the column ordering
    pub fn with_ordering(mut self, ordering: ColumnOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Trust caller arrays: only lengths and end pointers are checked
    pub fn without_structure_check(mut self) -> Self {
        self.check_structure = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OperatorConfig::default();
        assert_eq!(config.pivot_threshold, 0.1);
        assert_eq!(config.ordering, ColumnOrdering::MinimumDegreeAtA);
        assert!(config.check_structure);
    }

    #[test]
    fn test_builder() {
        let config = OperatorConfig::default()
            .with_pivot_threshold(1.0)
            .with_ordering(ColumnOrdering::Natural)
            .without_structure_check();
        assert_eq!(config.pivot_threshold, 1.0);
        assert_eq!(config.ordering, ColumnOrdering::Natural);
        assert!(!config.check_structure);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_fills_missing_fields() {
        let config: OperatorConfig =
            serde_json::from_str(r#"{ "ordering": "Natural" }"#).expect("valid json");
        assert_eq!(config.ordering, ColumnOrdering::Natural);
        assert_eq!(config.pivot_threshold, 0.1);
        assert!(config.check_structure);
    }
}
