//! Unitarray Units - unit registry and dimensional analysis
//!
//! Parses unit expressions such as `"kg m / s ** 2"` into canonical
//! decompositions, tracks their physical dimensions and converts values
//! between compatible units, including offset units like Celsius.
//!
//! Built-in families:
//! - SI prefixes (pico through tera)
//! - Length, mass, time and derived mechanics
//! - Temperature (K, degC, degF, degR) with `delta_` difference units
//! - Angles, plus `degrees_north` / `degrees_east`
//! - `percent` (`%` after normalization)

mod decomposition;
mod definition;
pub mod dimension;
pub mod error;
mod options;
mod parse;
mod unit;
mod units;

pub use decomposition::{Decomposition, Exponent};
pub use definition::{Definition, DefinitionValue, PrefixDefinition, UnitDefinition};
pub use dimension::Dimension;
pub use error::UnitError;
pub use options::{RegistryOptions, AUTOCONVERT_ENV};
pub use parse::{parse_expression, parse_quantity_string, Parsed};
pub use unit::{Converter, Prefix, Unit, DELTA_PREFIX};
pub use units::{normalize, UnitRegistry, CUSTOM_DEFINITIONS, DEFAULT_DEFINITIONS};
