//! Errors raised by labeled array operations

use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const SHAPE_MISMATCH: &str = "SHAPE_MISMATCH";
    pub const DIMS_MISMATCH: &str = "DIMS_MISMATCH";
    pub const INVALID_DIMS: &str = "INVALID_DIMS";
    pub const INVALID_COORD: &str = "INVALID_COORD";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("operands could not be broadcast together with shapes {left:?} and {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("dimension names differ: {left:?} vs {right:?}")]
    DimsMismatch { left: Vec<String>, right: Vec<String> },

    #[error("data has {ndim} dimensions but names were given for {dims:?}")]
    InvalidDims { ndim: usize, dims: Vec<String> },

    #[error("coordinate '{name}' has {len} values but dimension has length {expected}")]
    InvalidCoord { name: String, len: usize, expected: usize },
}

impl ArrayError {
    pub fn code(&self) -> &'static str {
        match self {
            ArrayError::ShapeMismatch { .. } => codes::SHAPE_MISMATCH,
            ArrayError::DimsMismatch { .. } => codes::DIMS_MISMATCH,
            ArrayError::InvalidDims { .. } => codes::INVALID_DIMS,
            ArrayError::InvalidCoord { .. } => codes::INVALID_COORD,
        }
    }
}
