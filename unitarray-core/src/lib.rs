//! Unitarray Core - labeled n-dimensional arrays
//!
//! A [`LabeledArray`] couples a numeric buffer with named dimensions,
//! per-dimension coordinates and an attribute record. It knows nothing
//! about physical units; the `units` attribute is only carried along.

mod attrs;
mod error;
mod labeled;

pub use attrs::{Attrs, UNITS_KEY};
pub use error::ArrayError;
pub use labeled::LabeledArray;

pub use ndarray::{ArrayD, IxDyn};
