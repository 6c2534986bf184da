//! Unit decompositions: canonical unit name -> rational exponent

use std::collections::BTreeMap;
use std::fmt;
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, One, Signed, Zero};
use serde::{Serialize, Deserialize};
use crate::UnitError;

/// Rational exponent of a unit or dimension
pub type Exponent = Ratio<i64>;

/// A compound unit as a product of named units raised to rational powers,
/// e.g. `{"meter": 1, "second": -1}`.
///
/// Zero exponents are never stored, so two decompositions are equal iff
/// they describe the same product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decomposition(BTreeMap<String, Exponent>);

impl Decomposition {
    /// The empty (dimensionless) decomposition
    pub fn new() -> Self {
        Self::default()
    }

    /// A single unit with exponent 1
    pub fn single(name: impl Into<String>) -> Self {
        let mut d = Self::new();
        d.0.insert(name.into(), Exponent::one());
        d
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of unit factors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<Exponent> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Exponent)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add `exp` to the exponent of `name`, dropping the entry if it cancels
    pub fn add_exponent(&mut self, name: &str, exp: Exponent) -> Result<(), UnitError> {
        if exp.is_zero() {
            return Ok(());
        }
        let total = self
            .get(name)
            .unwrap_or_else(Exponent::zero)
            .checked_add(&exp)
            .ok_or_else(|| UnitError::overflow(name))?;
        if total.is_zero() {
            self.0.remove(name);
        } else {
            self.0.insert(name.to_string(), total);
        }
        Ok(())
    }

    /// Build from `(name, exponent)` pairs, summing repeated names
    pub fn from_factors<I, S>(factors: I) -> Result<Self, UnitError>
    where
        I: IntoIterator<Item = (S, Exponent)>,
        S: AsRef<str>,
    {
        let mut d = Decomposition::new();
        for (name, exp) in factors {
            d.add_exponent(name.as_ref(), exp)?;
        }
        Ok(d)
    }

    /// Product of two units (exponents add)
    pub fn multiply(&self, other: &Decomposition) -> Result<Decomposition, UnitError> {
        let mut result = self.clone();
        for (name, exp) in other.iter() {
            result.add_exponent(name, exp)?;
        }
        Ok(result)
    }

    /// Quotient of two units (exponents subtract)
    pub fn divide(&self, other: &Decomposition) -> Result<Decomposition, UnitError> {
        self.multiply(&other.power(-Exponent::one())?)
    }

    /// Raise every factor to `exp`
    pub fn power(&self, exp: Exponent) -> Result<Decomposition, UnitError> {
        let mut result = Decomposition::new();
        for (name, e) in self.iter() {
            let scaled = e.checked_mul(&exp).ok_or_else(|| UnitError::overflow(name))?;
            result.add_exponent(name, scaled)?;
        }
        Ok(result)
    }

    /// Replace factor `from` by `to`, keeping its exponent
    pub fn rename(&self, from: &str, to: &str) -> Result<Decomposition, UnitError> {
        let mut result = Decomposition::new();
        for (name, exp) in self.iter() {
            let name = if name == from { to } else { name };
            result.add_exponent(name, exp)?;
        }
        Ok(result)
    }
}

/// Writes `name ** |exp|`; the sign is carried by numerator or denominator placement
fn write_factor(parts: &mut Vec<String>, name: &str, exp: Exponent) {
    let numer = exp.numer().unsigned_abs();
    let denom = exp.denom().unsigned_abs();
    if numer == 1 && denom == 1 {
        parts.push(name.to_string());
    } else if denom == 1 {
        parts.push(format!("{} ** {}", name, numer));
    } else {
        parts.push(format!("{} ** ({}/{})", name, numer, denom));
    }
}

/// Renders a parseable unit string, e.g. `kilometer / second ** 2`.
/// The empty decomposition renders as the empty string.
impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for (name, exp) in self.iter() {
            if exp.is_positive() {
                write_factor(&mut numerator, name, exp);
            } else {
                write_factor(&mut denominator, name, exp);
            }
        }

        if numerator.is_empty() && denominator.is_empty() {
            return Ok(());
        }
        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", numerator.join(" * "))?;
        }
        for d in denominator {
            write!(f, " / {}", d)?;
        }
        Ok(())
    }
}
