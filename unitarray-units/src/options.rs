//! Registry configuration

use std::env;
use serde::{Serialize, Deserialize};

/// Environment variable read by [`RegistryOptions::from_env`]
pub const AUTOCONVERT_ENV: &str = "UNITARRAY_AUTOCONVERT_OFFSET";

/// Behavior switches for a [`crate::UnitRegistry`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOptions {
    /// Allow a lone offset unit (e.g. `degC`, exponent 1) to take part in
    /// multiplication and division by first converting it to root units.
    pub autoconvert_offset_to_base_unit: bool,
}

impl RegistryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set offset auto-conversion
    pub fn with_autoconvert_offset_to_base_unit(mut self, enabled: bool) -> Self {
        self.autoconvert_offset_to_base_unit = enabled;
        self
    }

    /// Defaults, overridden by `UNITARRAY_AUTOCONVERT_OFFSET`
    pub fn from_env() -> Self {
        let enabled = env::var(AUTOCONVERT_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self::default().with_autoconvert_offset_to_base_unit(enabled)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
