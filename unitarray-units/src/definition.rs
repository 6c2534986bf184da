//! Definition lines for the unit registry
//!
//! ```text
//! kilo- = 1e3 = k-                                   # prefix
//! meter = [length] = m = metre                       # root unit
//! newton = kilogram * meter / second ** 2 = N        # derived unit
//! degree_Celsius = kelvin; offset: 273.15 = degC     # offset unit
//! ```
//!
//! The field after the value is the symbol (`_` for none); every field
//! after that is an alias.

use crate::parse::{is_bare_identifier, parse_expression};
use crate::{Dimension, UnitError};

/// A parsed definition line
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Prefix(PrefixDefinition),
    Unit(UnitDefinition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixDefinition {
    pub name: String,
    pub factor: f64,
    pub symbol: Option<String>,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitDefinition {
    pub name: String,
    pub value: DefinitionValue,
    /// Additive offset to the reference unit, zero for ratio units
    pub offset: f64,
    pub symbol: Option<String>,
    pub aliases: Vec<String>,
}

/// Right-hand side of a unit definition
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionValue {
    /// A root unit of the given dimension, e.g. `[length]`
    Root(Dimension),
    /// An expression in previously defined units, e.g. `1000 * meter`
    Expression(String),
}

fn symbol_field(field: &str) -> Option<String> {
    if field == "_" {
        None
    } else {
        Some(field.to_string())
    }
}

impl Definition {
    /// Parse one line. Blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Definition>, UnitError> {
        let content = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = content.split('=').map(str::trim).collect();
        if fields.len() < 2 || fields.iter().any(|f| f.is_empty()) {
            return Err(UnitError::definition(content, "expected 'name = value [= symbol] [= alias ...]'"));
        }

        let name = fields[0];
        if let Some(prefix) = name.strip_suffix('-') {
            return Self::parse_prefix(content, prefix, &fields[1..]).map(Some);
        }
        if !is_bare_identifier(name) {
            return Err(UnitError::definition(content, format!("'{}' is not a valid unit name", name)));
        }

        let (value, modifiers) = match fields[1].split_once(';') {
            Some((value, modifiers)) => (value.trim(), Some(modifiers)),
            None => (fields[1], None),
        };

        let mut offset = 0.0;
        for modifier in modifiers.into_iter().flat_map(|m| m.split(';')) {
            let (key, raw) = modifier.split_once(':')
                .ok_or_else(|| UnitError::definition(content, format!("malformed modifier '{}'", modifier.trim())))?;
            match key.trim() {
                "offset" => {
                    offset = raw.trim().parse::<f64>()
                        .map_err(|_| UnitError::definition(content, format!("invalid offset '{}'", raw.trim())))?;
                }
                other => {
                    return Err(UnitError::definition(content, format!("unknown modifier '{}'", other)));
                }
            }
        }

        let value = if value.starts_with('[') {
            let dim = Dimension::from_definition(value)
                .ok_or_else(|| UnitError::definition(content, format!("unknown dimension '{}'", value)))?;
            DefinitionValue::Root(dim)
        } else {
            DefinitionValue::Expression(value.to_string())
        };

        Ok(Some(Definition::Unit(UnitDefinition {
            name: name.to_string(),
            value,
            offset,
            symbol: fields.get(2).and_then(|s| symbol_field(s)),
            aliases: fields.iter().skip(3).map(|s| s.to_string()).collect(),
        })))
    }

    fn parse_prefix(content: &str, name: &str, rest: &[&str]) -> Result<Definition, UnitError> {
        let (factor, units) = parse_expression(rest[0], |id| {
            Err(UnitError::definition(content, format!("prefix value may not reference '{}'", id)))
        })?;
        if !units.is_empty() {
            return Err(UnitError::definition(content, "prefix value must be a number"));
        }

        let strip = |s: &str| s.strip_suffix('-').unwrap_or(s).to_string();
        Ok(Definition::Prefix(PrefixDefinition {
            name: name.to_string(),
            factor,
            symbol: rest.get(1).and_then(|s| symbol_field(s)).map(|s| strip(&s)),
            aliases: rest.iter().skip(2).map(|s| strip(s)).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::LENGTH;

    fn unit_def(line: &str) -> UnitDefinition {
        match Definition::parse(line).unwrap() {
            Some(Definition::Unit(def)) => def,
            other => panic!("expected unit definition, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_and_comment() {
        assert_eq!(Definition::parse("").unwrap(), None);
        assert_eq!(Definition::parse("   # comment").unwrap(), None);
    }

    #[test]
    fn test_root_unit() {
        let def = unit_def("meter = [length] = m = metre  # SI");
        assert_eq!(def.name, "meter");
        assert_eq!(def.value, DefinitionValue::Root(Dimension::base(LENGTH)));
        assert_eq!(def.symbol.as_deref(), Some("m"));
        assert_eq!(def.aliases, vec!["metre".to_string()]);
    }

    #[test]
    fn test_offset_unit() {
        let def = unit_def("degree_Celsius = kelvin; offset: 273.15 = degC = celsius");
        assert_eq!(def.value, DefinitionValue::Expression("kelvin".into()));
        assert_eq!(def.offset, 273.15);
        assert_eq!(def.symbol.as_deref(), Some("degC"));
    }

    #[test]
    fn test_custom_families() {
        let def = unit_def("percent = 0.01 * count");
        assert_eq!(def.value, DefinitionValue::Expression("0.01 * count".into()));
        assert_eq!(def.symbol, None);

        let def = unit_def("degrees_north = degree_north = degree_N = degrees_N = degreeN = degreesN");
        assert_eq!(def.value, DefinitionValue::Expression("degree_north".into()));
        assert_eq!(def.symbol.as_deref(), Some("degree_N"));
        assert_eq!(def.aliases.len(), 3);
    }

    #[test]
    fn test_prefix() {
        match Definition::parse("kilo- = 1e3 = k-").unwrap() {
            Some(Definition::Prefix(p)) => {
                assert_eq!(p.name, "kilo");
                assert_eq!(p.factor, 1000.0);
                assert_eq!(p.symbol.as_deref(), Some("k"));
            }
            other => panic!("expected prefix, got {:?}", other),
        }
        assert!(Definition::parse("kilo- = 1e3 * meter = k-").is_err());
    }

    #[test]
    fn test_malformed() {
        assert!(Definition::parse("meter").is_err());
        assert!(Definition::parse("meter = ").is_err());
        assert!(Definition::parse("2x = meter").is_err());
        assert!(Definition::parse("foo = [colour]").is_err());
        assert!(Definition::parse("foo = kelvin; scale: 2").is_err());
    }
}
