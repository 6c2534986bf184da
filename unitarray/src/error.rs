//! Error taxonomy for unit-carrying arrays

use thiserror::Error;
use unitarray_core::ArrayError;
use unitarray_units::UnitError;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const MISSING_UNITS: &str = "MISSING_UNITS";
    pub const INVALID_UNITS: &str = "INVALID_UNITS";
    pub const TYPE_ERROR: &str = "TYPE_ERROR";
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Undefined units, dimensionality and offset-unit failures
    #[error(transparent)]
    Units(#[from] UnitError),

    #[error(transparent)]
    Array(#[from] ArrayError),

    /// The array carries no `units` attribute at all
    #[error("\"units\" not present in attrs")]
    MissingUnits,

    /// A conversion target the array cannot be converted to
    #[error("invalid units '{units}': {message}")]
    InvalidUnits { units: String, message: String },

    /// Operand kinds that cannot be combined
    #[error("{0}")]
    Type(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Units(e) => e.code(),
            Error::Array(e) => e.code(),
            Error::MissingUnits => codes::MISSING_UNITS,
            Error::InvalidUnits { .. } => codes::INVALID_UNITS,
            Error::Type(_) => codes::TYPE_ERROR,
        }
    }

    /// True for raw dimensionality failures. Conversions to explicit target
    /// units report them as [`Error::InvalidUnits`] instead.
    pub fn is_dimensionality(&self) -> bool {
        matches!(self, Error::Units(UnitError::Dimensionality { .. }))
    }

    pub fn is_offset_calculus(&self) -> bool {
        matches!(self, Error::Units(UnitError::OffsetUnitCalculus { .. }))
    }
}
