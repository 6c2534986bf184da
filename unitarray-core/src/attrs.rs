//! Typed attribute record attached to every labeled array

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use serde_json::Value;

/// Well-known attribute key holding the unit string
pub const UNITS_KEY: &str = "units";

/// Array attributes.
///
/// The unit string has its own field so that its absence is visible in the
/// type; every other caller-defined attribute lives in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    #[serde(rename = "units", skip_serializing_if = "Option::is_none", default)]
    units: Option<String>,

    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the unit string
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn set_units(&mut self, units: impl Into<String>) {
        self.units = Some(units.into());
    }

    /// Look up an attribute by key. The `units` key is served from the
    /// typed field.
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == UNITS_KEY {
            return self.units.clone().map(Value::String);
        }
        self.extra.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        if key == UNITS_KEY {
            self.units.is_some()
        } else {
            self.extra.contains_key(key)
        }
    }

    /// Insert an attribute. A string stored under `units` goes to the typed
    /// field; any other value under that key is rejected and returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if key == UNITS_KEY {
            return match value {
                Value::String(s) => {
                    self.units = Some(s);
                    None
                }
                other => Some(other),
            };
        }
        self.extra.insert(key, value);
        None
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_key_routes_to_typed_field() {
        let mut attrs = Attrs::new();
        assert!(!attrs.contains(UNITS_KEY));

        attrs.insert("units", "m/s");
        assert_eq!(attrs.units(), Some("m/s"));
        assert!(attrs.extra().is_empty());

        attrs.insert("long_name", "wind speed");
        assert_eq!(attrs.get("long_name"), Some(Value::String("wind speed".into())));
    }

    #[test]
    fn test_non_string_units_rejected() {
        let mut attrs = Attrs::new().with_units("K");
        let rejected = attrs.insert(UNITS_KEY, 3);
        assert_eq!(rejected, Some(Value::from(3)));
        assert_eq!(attrs.units(), Some("K"));
    }

    #[test]
    fn test_serde_flattens_extra() {
        let mut attrs = Attrs::new().with_units("degC");
        attrs.insert("source", "station 4");
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["units"], "degC");
        assert_eq!(json["source"], "station 4");

        let back: Attrs = serde_json::from_value(json).unwrap();
        assert_eq!(back, attrs);
    }
}
