//! Configuration-time errors.
//!
//! Evolutions that leave the state space are not errors: they are recorded as
//! [`Successor::OutOfSpace`][crate::types::Successor::OutOfSpace] and consumed
//! by the fixed point.

use thiserror::Error;

/// Result type for verification operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A space must have at least one axis.
    #[error("space must have at least one dimension")]
    ZeroDimension,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("cell width on axis {axis} must be positive and finite, got {eta}")]
    InvalidCellWidth { axis: usize, eta: f64 },

    #[error("invalid interval on axis {axis}: lower bound {lower} is not below upper bound {upper}")]
    InvalidInterval { axis: usize, lower: f64, upper: f64 },

    /// Every cell must have the same shape and lie inside the space.
    #[error("cell width {eta} on axis {axis} does not divide the axis width {width}")]
    NonDividingCellWidth { axis: usize, eta: f64, width: f64 },

    /// Hyperplane normals are only a sound over-approximation for linear maps.
    #[error("refined transitions require a linear plant")]
    RefinedRequiresLinearPlant,

    #[error("cell index {index} is out of range for {cardinality} cells")]
    IndexOutOfRange { index: usize, cardinality: usize },

    #[error("input {0} lies outside the input space")]
    InputOutOfSpace(String),

    #[error("controller has no action for state cell {0}")]
    MissingControlAction(usize),

    #[error("transitions have not been computed")]
    TransitionsNotComputed,
}
