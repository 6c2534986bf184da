//! Errors raised by the unit registry

use thiserror::Error;
use crate::Dimension;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const UNDEFINED_UNIT: &str = "UNDEFINED_UNIT";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const DIMENSIONALITY: &str = "DIMENSIONALITY";
    pub const OFFSET_UNIT_CALCULUS: &str = "OFFSET_UNIT_CALCULUS";
    pub const DEFINITION: &str = "DEFINITION";
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// A unit name the registry does not know
    #[error("'{0}' is not defined in the unit registry")]
    UndefinedUnit(String),

    #[error("cannot parse unit expression '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("cannot convert from '{from}' ({from_dim}) to '{to}' ({to_dim})")]
    Dimensionality {
        from: String,
        to: String,
        from_dim: Dimension,
        to_dim: Dimension,
    },

    #[error("ambiguous operation with offset unit ({left}, {right})")]
    OffsetUnitCalculus { left: String, right: String },

    #[error("invalid unit definition '{definition}': {reason}")]
    Definition { definition: String, reason: String },
}

impl UnitError {
    pub fn parse(input: &str, reason: impl Into<String>) -> Self {
        UnitError::Parse { input: input.to_string(), reason: reason.into() }
    }

    /// A rational exponent of `input` left the `i64` range
    pub fn overflow(input: &str) -> Self {
        UnitError::parse(input, "exponent overflow")
    }

    pub fn definition(definition: &str, reason: impl Into<String>) -> Self {
        UnitError::Definition { definition: definition.to_string(), reason: reason.into() }
    }

    pub fn offset(left: impl Into<String>, right: impl Into<String>) -> Self {
        UnitError::OffsetUnitCalculus { left: left.into(), right: right.into() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            UnitError::UndefinedUnit(_) => codes::UNDEFINED_UNIT,
            UnitError::Parse { .. } => codes::PARSE_ERROR,
            UnitError::Dimensionality { .. } => codes::DIMENSIONALITY,
            UnitError::OffsetUnitCalculus { .. } => codes::OFFSET_UNIT_CALCULUS,
            UnitError::Definition { .. } => codes::DEFINITION,
        }
    }
}
