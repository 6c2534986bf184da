//! Dimensional analysis types
//!
//! Each physical quantity has dimensions represented as a 7-element vector
//! of rational exponents:
//! [length, mass, time, current, temperature, substance, luminosity]
//!
//! Angles and counts are dimensionless.

use std::fmt;
use num_traits::{CheckedAdd, CheckedMul, One, Zero};
use serde::{Serialize, Deserialize};
use crate::{Exponent, UnitError};

/// Dimension indices for the 7 SI base quantities
pub const LENGTH: usize = 0;
pub const MASS: usize = 1;
pub const TIME: usize = 2;
pub const CURRENT: usize = 3;
pub const TEMPERATURE: usize = 4;
pub const SUBSTANCE: usize = 5;
pub const LUMINOSITY: usize = 6;

/// Names used in definition files, e.g. `meter = [length]`
const BASE_NAMES: [&str; 7] = [
    "length", "mass", "time", "current", "temperature", "substance", "luminosity",
];

/// Common derived dimensions, by integer exponents
const NAMED: [([i64; 7], &str); 17] = [
    ([0, 0, 0, 0, 0, 0, 0], "dimensionless"),
    ([1, 0, 0, 0, 0, 0, 0], "length"),
    ([0, 1, 0, 0, 0, 0, 0], "mass"),
    ([0, 0, 1, 0, 0, 0, 0], "time"),
    ([0, 0, 0, 1, 0, 0, 0], "current"),
    ([0, 0, 0, 0, 1, 0, 0], "temperature"),
    ([0, 0, 0, 0, 0, 1, 0], "substance"),
    ([0, 0, 0, 0, 0, 0, 1], "luminosity"),
    ([1, 0, -1, 0, 0, 0, 0], "velocity"),
    ([1, 0, -2, 0, 0, 0, 0], "acceleration"),
    ([1, 1, -2, 0, 0, 0, 0], "force"),
    ([2, 1, -2, 0, 0, 0, 0], "energy"),
    ([2, 1, -3, 0, 0, 0, 0], "power"),
    ([-1, 1, -2, 0, 0, 0, 0], "pressure"),
    ([2, 0, 0, 0, 0, 0, 0], "area"),
    ([3, 0, 0, 0, 0, 0, 0], "volume"),
    ([0, 0, -1, 0, 0, 0, 0], "frequency"),
];

/// Represents the dimensions of a physical quantity
/// as exponents of the 7 SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// [length, mass, time, current, temperature, substance, luminosity]
    pub exponents: [Exponent; 7],
}

impl Dimension {
    /// Dimensionless quantity (all exponents zero)
    pub fn dimensionless() -> Self {
        Dimension { exponents: [Exponent::zero(); 7] }
    }

    /// A single base dimension with exponent 1
    pub fn base(index: usize) -> Self {
        let mut dim = Self::dimensionless();
        dim.exponents[index] = Exponent::from_integer(1);
        dim
    }

    /// Create a dimension from integer exponents
    pub fn from_integers(exponents: [i64; 7]) -> Self {
        Dimension { exponents: exponents.map(Exponent::from_integer) }
    }

    /// Look up a base dimension by its bracketed definition name:
    /// `[length]`, `[time]`, ... and `[]` for dimensionless.
    pub fn from_definition(s: &str) -> Option<Self> {
        let inner = s.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
        if inner.is_empty() {
            return Some(Self::dimensionless());
        }
        BASE_NAMES.iter().position(|&n| n == inner).map(Self::base)
    }

    /// Check if this is a dimensionless quantity
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|e| e.is_zero())
    }

    /// Multiply dimensions (add exponents)
    pub fn multiply(&self, other: &Dimension) -> Result<Dimension, UnitError> {
        let mut result = self.exponents;
        for (r, o) in result.iter_mut().zip(other.exponents.iter()) {
            *r = r.checked_add(o).ok_or_else(|| UnitError::overflow(&self.to_string()))?;
        }
        Ok(Dimension { exponents: result })
    }

    /// Divide dimensions (subtract exponents)
    pub fn divide(&self, other: &Dimension) -> Result<Dimension, UnitError> {
        self.multiply(&other.invert()?)
    }

    /// Raise to a rational power (multiply exponents)
    pub fn power(&self, exp: Exponent) -> Result<Dimension, UnitError> {
        let mut result = self.exponents;
        for r in result.iter_mut() {
            *r = r.checked_mul(&exp).ok_or_else(|| UnitError::overflow(&self.to_string()))?;
        }
        Ok(Dimension { exponents: result })
    }

    /// Invert dimensions (negate exponents)
    pub fn invert(&self) -> Result<Dimension, UnitError> {
        self.power(-Exponent::one())
    }

    /// Get the dimension name if it matches a common dimension
    pub fn name(&self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(exps, _)| Dimension::from_integers(*exps) == *self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = ["L", "M", "T", "I", "Θ", "N", "J"];
        let mut parts = Vec::new();

        for (i, exp) in self.exponents.iter().enumerate() {
            if exp.is_zero() {
                continue;
            }
            if *exp == Exponent::from_integer(1) {
                parts.push(names[i].to_string());
            } else if exp.is_integer() {
                parts.push(format!("{}^{}", names[i], exp));
            } else {
                parts.push(format!("{}^({})", names[i], exp));
            }
        }

        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::dimensionless()
    }
}
