//! Error types for the spatial hash.
//!
//! Every failure is local and recoverable: configuration problems are raised
//! before a build touches the layout, and query problems leave the layout
//! untouched.

use glam::Vec3;
use thiserror::Error;

/// Errors that can occur while configuring, building, or querying a
/// [`SpatialHash`](crate::SpatialHash).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// Cell size was zero, negative, or not finite.
    #[error("Cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),
    /// Table size was zero or does not fit the signed hash range.
    #[error("Table size must be in 1..={max}, got {0}", max = i32::MAX)]
    InvalidTableSize(u32),
    /// Bounding volume used to derive a cell size was degenerate.
    #[error("Bounds must be positive and finite on every axis, got {0}")]
    InvalidBounds(Vec3),
    /// Target neighbours per cell (or the point count) was zero.
    #[error("Cell size derivation needs a non-zero neighbour target and point count")]
    InvalidNeighborTarget,
    /// A position handed to a build was NaN or infinite.
    #[error("Position of point {index} is not finite")]
    NonFinitePosition {
        /// Index of the offending point.
        index: usize,
    },
    /// Point indices are stored as `u32`.
    #[error("Cannot index {0} points, at most {max} are supported", max = u32::MAX)]
    TooManyPoints(usize),
    /// Query center was not finite, or radius was negative or not finite.
    #[error("Invalid query: center {center}, radius {radius}")]
    InvalidQuery {
        /// Requested query center.
        center: Vec3,
        /// Requested query radius.
        radius: f32,
    },
    /// A bounded query buffer could not hold every candidate.
    #[error("Query produced {required} candidates but the buffer is limited to {limit}")]
    CapacityExceeded {
        /// Maximum number of candidates the buffer accepts.
        limit: usize,
        /// Number of candidates the query would have produced.
        required: usize,
    },
    /// Positions used for exact filtering do not match the built layout.
    #[error("Layout was built from {expected} points but {actual} positions were given")]
    PositionCountMismatch {
        /// Point count of the layout.
        expected: usize,
        /// Length of the slice passed in.
        actual: usize,
    },
}

impl SpatialError {
    /// Whether this error comes from configuration rather than per-tick input.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SpatialError::InvalidCellSize(_)
                | SpatialError::InvalidTableSize(_)
                | SpatialError::InvalidBounds(_)
                | SpatialError::InvalidNeighborTarget
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpatialError>;
