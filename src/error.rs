//! Error types for the closest crate.

/// Error type for all fallible operations in the closest crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClosestError {
    /// Returned when the reference list has no elements.
    #[error("reference list is empty")]
    EmptyReferenceList,

    /// Returned when a list element's dimensionality differs from the first
    /// element's.
    #[error("list element {index} has {dimensions} dimensions, expected {expected}")]
    NonUniformList {
        /// Position of the offending element.
        index: usize,
        /// Dimensionality of the offending element.
        dimensions: usize,
        /// Dimensionality fixed by the first element.
        expected: usize,
    },

    /// Returned when a query's dimensionality differs from the reference
    /// list's.
    #[error("query has {query} dimensions, reference list has {expected}")]
    DimensionMismatch {
        /// Dimensionality of the query.
        query: usize,
        /// Dimensionality of the reference list.
        expected: usize,
    },
}
