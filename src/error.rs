//! Errors reported by tree construction and queries.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type KdTreeResult<T> = Result<T, KdTreeError>;

/// Configuration errors detected at the API boundary.
///
/// Degenerate but valid inputs (no points, `k == 0`, `k` larger than the
/// point count, duplicate points) are never reported as errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KdTreeError {
    /// A point's dimension differs from the first point's dimension.
    #[error("point {index} has {found} coordinates, expected {expected}")]
    InconsistentDimension {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// Points must have at least one coordinate.
    #[error("points must have at least one coordinate")]
    ZeroDimension,
    /// Leaf size must be at least one.
    #[error("leaf_size must be at least 1 (got {got})")]
    InvalidLeafSize { got: usize },
    /// A point coordinate is NaN or infinite.
    #[error("point {index} has a non-finite coordinate on axis {axis}")]
    NonFiniteCoordinate { index: usize, axis: usize },
    /// The query's dimension differs from the tree's dimension.
    #[error("query has {found} coordinates but the tree has dimension {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    /// A query coordinate is NaN or infinite.
    #[error("query has a non-finite coordinate on axis {axis}")]
    NonFiniteQuery { axis: usize },
    /// Search radius (or range) must be finite and non-negative.
    #[error("search radius must be finite and non-negative (got {radius})")]
    InvalidRadius { radius: f64 },
}
