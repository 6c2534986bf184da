//! Registered units, prefixes and the affine converter between units

use serde::{Serialize, Deserialize};
use crate::{Decomposition, Dimension};

/// Name prefix marking the difference unit of an offset unit
pub const DELTA_PREFIX: &str = "delta_";

/// A named unit as stored in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Canonical name (e.g. "meter", "degree_Celsius")
    pub name: String,
    /// Short symbol (e.g. "m", "degC")
    pub symbol: Option<String>,
    pub aliases: Vec<String>,
    /// The dimensional signature
    pub dimension: Dimension,
    /// Root units this unit is expressed in
    pub reference: Decomposition,
    /// value_root = value * factor + offset
    pub factor: f64,
    /// Offset for non-proportional units like Celsius and Fahrenheit
    pub offset: f64,
}

impl Unit {
    /// A root unit refers to itself
    pub fn root(name: &str, dimension: Dimension) -> Self {
        Unit {
            name: name.to_string(),
            symbol: None,
            aliases: Vec::new(),
            dimension,
            reference: Decomposition::single(name),
            factor: 1.0,
            offset: 0.0,
        }
    }

    /// Check if this unit converts by scale alone (no offset)
    pub fn is_multiplicative(&self) -> bool {
        self.offset == 0.0
    }

    pub fn is_delta(&self) -> bool {
        self.name.starts_with(DELTA_PREFIX)
    }

    /// The difference unit of an offset unit: same scale, no offset
    pub fn delta(&self) -> Unit {
        let delta = |s: &String| format!("{}{}", DELTA_PREFIX, s);
        Unit {
            name: delta(&self.name),
            symbol: self.symbol.as_ref().map(delta),
            aliases: self.aliases.iter().map(delta).collect(),
            dimension: self.dimension,
            reference: self.reference.clone(),
            factor: self.factor,
            offset: 0.0,
        }
    }

    /// Every spelling under which the unit can be looked up
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.symbol.as_deref())
            .chain(self.aliases.iter().map(|s| s.as_str()))
    }
}

/// SI-style prefix (e.g. kilo = 1e3 = k)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    pub name: String,
    pub symbol: Option<String>,
    pub aliases: Vec<String>,
    pub factor: f64,
}

impl Prefix {
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.symbol.as_deref())
            .chain(self.aliases.iter().map(|s| s.as_str()))
    }
}

/// Affine map between two units: `out = value * factor + shift`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Converter {
    pub factor: f64,
    pub shift: f64,
}

impl Converter {
    pub const IDENTITY: Converter = Converter { factor: 1.0, shift: 0.0 };

    /// Compose from the root-space maps of the source and target units
    /// (`root = value * scale + offset` on each side).
    pub fn between(from: (f64, f64), to: (f64, f64)) -> Self {
        let (from_scale, from_offset) = from;
        let (to_scale, to_offset) = to;
        Converter {
            factor: from_scale / to_scale,
            shift: (from_offset - to_offset) / to_scale,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.factor == 1.0 && self.shift == 0.0
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.factor + self.shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::TEMPERATURE;

    fn celsius() -> Unit {
        Unit {
            name: "degree_Celsius".into(),
            symbol: Some("degC".into()),
            aliases: vec!["celsius".into()],
            dimension: Dimension::base(TEMPERATURE),
            reference: Decomposition::single("kelvin"),
            factor: 1.0,
            offset: 273.15,
        }
    }

    #[test]
    fn test_offset_unit_round_trip() {
        let c = celsius();
        assert!(!c.is_multiplicative());
        let kelvin = (1.0, 0.0);
        assert_eq!(Converter::between((c.factor, c.offset), kelvin).apply(0.0), 273.15);
        assert!((Converter::between(kelvin, (c.factor, c.offset)).apply(373.15) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_delta_unit() {
        let d = celsius().delta();
        assert_eq!(d.name, "delta_degree_Celsius");
        assert_eq!(d.symbol.as_deref(), Some("delta_degC"));
        assert_eq!(d.aliases, vec!["delta_celsius".to_string()]);
        assert!(d.is_multiplicative());
        assert!(d.is_delta());
        assert_eq!((d.factor, d.offset), (1.0, 0.0));
    }

    #[test]
    fn test_converter_between() {
        // degC -> degF: F = C * 9/5 + 32
        let c = (1.0, 273.15);
        let f = (5.0 / 9.0, 255.37222222222223);
        let conv = Converter::between(c, f);
        assert!((conv.apply(100.0) - 212.0).abs() < 1e-9);
        assert!((conv.apply(0.0) - 32.0).abs() < 1e-9);

        let km_to_m = Converter::between((1000.0, 0.0), (1.0, 0.0));
        assert_eq!(km_to_m.apply(1.5), 1500.0);
        assert!(Converter::IDENTITY.is_identity());
    }
}
