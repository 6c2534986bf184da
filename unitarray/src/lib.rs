//! Unitarray - unit-aware labeled arrays
//!
//! A [`UnitArray`] is a labeled array whose `units` attribute takes part in
//! every operation: addition checks dimensionality and converts operands,
//! multiplication combines units, comparisons work across scales, and
//! offset units such as degC follow the affine rules in [`engine`].
//!
//! ```ignore
//! use unitarray::quantity;
//!
//! let d = quantity(vec![1.0, 2.0], "km").add(&quantity(vec![500.0, 0.0], "m"))?;
//! assert_eq!(d.units()?, "km");
//! ```

mod array;
pub mod engine;
mod error;

pub use array::{Operand, UnitArray};
pub use engine::CompareOp;
pub use error::{codes, Error};

pub use unitarray_core::{ArrayD, ArrayError, Attrs, IxDyn, LabeledArray, UNITS_KEY};
pub use unitarray_units::{
    normalize, Decomposition, Dimension, Exponent, RegistryOptions, UnitError, UnitRegistry,
};

use std::sync::Arc;

/// Tag values with units using the shared registry
pub fn quantity(values: impl Into<LabeledArray>, units: impl Into<String>) -> UnitArray {
    UnitArray::quantity(values, units)
}

/// True if the shared registry understands `units`; never fails
pub fn is_valid_unit(units: &str) -> bool {
    unit_registry().is_valid(units)
}

/// The process-wide registry with the default and custom unit families
pub fn unit_registry() -> Arc<UnitRegistry> {
    UnitRegistry::default_shared()
}
